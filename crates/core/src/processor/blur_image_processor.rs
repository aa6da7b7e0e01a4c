use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::blurring::domain::blur_params::BlurParams;
use crate::blurring::domain::processing_error::ProcessingError;
use crate::blurring::infrastructure::kernel_runner::KernelRunner;
use crate::blurring::infrastructure::scratch_buffers::ScratchStore;
use crate::caching::weak_result_cache::WeakResultCache;
use crate::delivery::blur_event::{BlurEvent, BlurProcessorDelegate};
use crate::delivery::notification_center::NotificationCenter;
use crate::delivery::result_fanout::{
    CallbackSink, DelegateSink, DelegateSlot, NotificationSink, ResultFanout,
};
use crate::dispatch::domain::execution_context::ExecutionContext;
use crate::dispatch::infrastructure::serial_queue::SerialQueue;
use crate::memory::memory_pressure::{MemoryPressureListener, MemoryPressureSubscription};
use crate::shared::image::Image;
use crate::shared::processor_id::ProcessorId;

use super::async_request::AsyncBlurRequest;
use super::blur_error::BlurError;
use super::processor_config::ProcessorConfig;

/// State shared between callers and the serial worker: kernel, result
/// cache and scratch memory.
struct Engine {
    id: ProcessorId,
    kernel: KernelRunner,
    cache: Mutex<WeakResultCache>,
    scratch: ScratchStore,
}

impl Engine {
    fn blur(&self, source: &Arc<Image>, params: BlurParams) -> Result<Arc<Image>, ProcessingError> {
        let params = params.normalized();
        if let Some(hit) = self.lock_cache().lookup(source.id(), params) {
            log::debug!(
                "{}: cache hit for {} radius={} iterations={}",
                self.id,
                source.id(),
                params.radius,
                params.iterations
            );
            return Ok(hit);
        }

        let blurred = Arc::new(self.kernel.run(source, params, &self.scratch)?);
        self.lock_cache().store(source.id(), params, &blurred);
        Ok(blurred)
    }

    fn lock_cache(&self) -> MutexGuard<'_, WeakResultCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MemoryPressureListener for Engine {
    fn on_low_memory(&self) {
        let freed = self.scratch.release();
        let dropped = self.lock_cache().clear();
        log::info!(
            "{}: low memory, released {freed} scratch bytes and {dropped} cache entries",
            self.id
        );
    }
}

/// Blurs one target image, synchronously or on a private serial queue.
///
/// Every blur produces a new image. Results stay cached, keyed by the
/// target image and the normalized (radius, iterations), for as long as
/// the application keeps them alive, so repeating a request is free.
/// Async results are delivered to the delegate, the request callbacks and
/// the notification center, all on the execution context passed with the
/// request. The processor listens for low-memory signals and drops its
/// scratch buffers and cache index when one arrives.
pub struct BlurImageProcessor {
    id: ProcessorId,
    engine: Arc<Engine>,
    target: Mutex<Option<Arc<Image>>>,
    delegate: DelegateSlot,
    notifications: Arc<NotificationCenter>,
    queue: SerialQueue,
    _memory_subscription: MemoryPressureSubscription,
}

impl BlurImageProcessor {
    pub fn new(image: Arc<Image>) -> Result<Self, BlurError> {
        Self::with_config(Some(image), ProcessorConfig::default())
    }

    pub fn with_config(image: Option<Arc<Image>>, config: ProcessorConfig) -> Result<Self, BlurError> {
        let id = ProcessorId::next();
        let queue = SerialQueue::new(&config.queue_name).map_err(BlurError::QueueSpawn)?;

        let mut cache = WeakResultCache::new();
        cache.rescope(image.as_ref().map(|i| i.id()));
        let engine = Arc::new(Engine {
            id,
            kernel: KernelRunner::new(config.convolver),
            cache: Mutex::new(cache),
            scratch: ScratchStore::new(),
        });

        let weak_engine: Weak<Engine> = Arc::downgrade(&engine);
        let listener: Weak<dyn MemoryPressureListener> = weak_engine;
        let memory_subscription = config.memory_pressure.subscribe(listener);

        log::debug!("{id}: created with queue '{}'", config.queue_name);
        Ok(Self {
            id,
            engine,
            target: Mutex::new(image),
            delegate: Arc::new(Mutex::new(None)),
            notifications: config.notifications,
            queue,
            _memory_subscription: memory_subscription,
        })
    }

    pub fn id(&self) -> ProcessorId {
        self.id
    }

    pub fn image(&self) -> Option<Arc<Image>> {
        self.lock_target().clone()
    }

    /// Replaces the target image. Requests already queued keep blurring the
    /// image they were issued with.
    pub fn set_image(&self, image: Option<Arc<Image>>) {
        let mut target = self.lock_target();
        self.engine
            .lock_cache()
            .rescope(image.as_ref().map(|i| i.id()));
        *target = image;
    }

    /// Registers the delegate. It is held weakly.
    pub fn set_delegate(&self, delegate: Weak<dyn BlurProcessorDelegate>) {
        *self.lock_delegate() = Some(delegate);
    }

    pub fn clear_delegate(&self) {
        *self.lock_delegate() = None;
    }

    /// Blurs the target image on the calling thread.
    ///
    /// No delegate, callback or notification fires for synchronous calls.
    /// A radius or iteration count of zero returns an unmodified copy.
    pub fn sync_blur(&self, radius: u32, iterations: u8) -> Result<Arc<Image>, BlurError> {
        let source = self.current_image()?;
        Ok(self.engine.blur(&source, BlurParams::new(radius, iterations))?)
    }

    /// Queues a blur of the current target image and returns immediately.
    ///
    /// Fails only when no target image is set; processing failures are
    /// delivered through the error sinks instead.
    pub fn async_blur(&self, request: AsyncBlurRequest) -> Result<(), BlurError> {
        let source = self.current_image()?;
        let AsyncBlurRequest {
            params,
            context,
            cancel_last_operation,
            on_success,
            on_error,
        } = request;

        if cancel_last_operation {
            self.queue.cancel_last();
        }

        let fanout = ResultFanout::new(self.id)
            .with_sink(DelegateSink::new(self.delegate.clone()))
            .with_sink(CallbackSink::new(on_success, on_error))
            .with_sink(NotificationSink::new(self.notifications.clone()));
        let engine = self.engine.clone();
        let id = self.id;

        self.queue.submit(Box::new(move || {
            let event = match engine.blur(&source, params) {
                Ok(image) => BlurEvent::Ready(image),
                Err(err) => {
                    log::warn!("{id}: blur failed: {err}");
                    BlurEvent::Failed(err.code())
                }
            };
            if !context.dispatch(Box::new(move || fanout.deliver(event))) {
                log::warn!("{id}: caller context is gone, dropping blur result");
            }
        }));
        Ok(())
    }

    /// Queues a blur whose result reaches only the delegate and the
    /// notification center.
    pub fn async_blur_simple(
        &self,
        radius: u32,
        iterations: u8,
        context: Arc<dyn ExecutionContext>,
    ) -> Result<(), BlurError> {
        self.async_blur(AsyncBlurRequest::new(radius, iterations, context))
    }

    /// Cancels the newest request that has not started. Returns `false`
    /// when nothing was waiting.
    pub fn cancel_last_async_operation(&self) -> bool {
        self.queue.cancel_last()
    }

    /// Cancels every request that has not started. A running request still
    /// completes and delivers. Cancelled requests deliver nothing.
    pub fn cancel_async_operations(&self) -> usize {
        self.queue.cancel_all()
    }

    pub fn pending_async_operations(&self) -> usize {
        self.queue.pending()
    }

    /// Blocks until no async request is queued or running.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_until_idle(timeout)
    }

    /// Releases scratch buffers and forgets cached results, exactly as a
    /// low-memory signal does.
    pub fn handle_low_memory(&self) {
        self.engine.on_low_memory();
    }

    pub fn cached_results(&self) -> usize {
        self.engine.lock_cache().len()
    }

    pub fn retained_scratch_bytes(&self) -> usize {
        self.engine.scratch.allocated_bytes()
    }

    fn current_image(&self) -> Result<Arc<Image>, BlurError> {
        self.lock_target().clone().ok_or(BlurError::NoTargetImage)
    }

    fn lock_target(&self) -> MutexGuard<'_, Option<Arc<Image>>> {
        self.target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_delegate(&self) -> MutexGuard<'_, Option<Weak<dyn BlurProcessorDelegate>>> {
        self.delegate
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
