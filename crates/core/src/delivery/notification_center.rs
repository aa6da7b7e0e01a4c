use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::blurring::domain::processing_error::ErrorCode;
use crate::shared::constants::{BLURRED_IMAGE_KEY, ERROR_CODE_KEY};
use crate::shared::image::Image;
use crate::shared::processor_id::ProcessorId;

/// A value in a notification's keyed payload.
#[derive(Clone, Debug)]
pub enum NotificationValue {
    Image(Arc<Image>),
    ErrorCode(ErrorCode),
}

/// A named broadcast with a keyed payload.
#[derive(Clone, Debug)]
pub struct Notification {
    pub name: &'static str,
    pub sender: ProcessorId,
    pub user_info: HashMap<&'static str, NotificationValue>,
}

impl Notification {
    pub fn new(name: &'static str, sender: ProcessorId) -> Self {
        Self {
            name,
            sender,
            user_info: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: NotificationValue) -> Self {
        self.user_info.insert(key, value);
        self
    }

    pub fn blurred_image(&self) -> Option<&Arc<Image>> {
        match self.user_info.get(BLURRED_IMAGE_KEY) {
            Some(NotificationValue::Image(image)) => Some(image),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self.user_info.get(ERROR_CODE_KEY) {
            Some(NotificationValue::ErrorCode(code)) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObserverId(u64);

type ObserverFn = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Observer {
    id: ObserverId,
    name: String,
    sender: Option<ProcessorId>,
    callback: ObserverFn,
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    list: Vec<Observer>,
}

/// Process-wide broadcast of blur notifications.
///
/// Observers run synchronously on the thread that posts, outside the
/// registry lock, so an observer may add or remove observers.
#[derive(Default)]
pub struct NotificationCenter {
    observers: Mutex<Observers>,
}

static GLOBAL_CENTER: OnceLock<Arc<NotificationCenter>> = OnceLock::new();

impl NotificationCenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn global() -> Arc<Self> {
        GLOBAL_CENTER.get_or_init(Self::new).clone()
    }

    /// Observes notifications called `name`, optionally only from `sender`.
    pub fn add_observer(
        &self,
        name: &str,
        sender: Option<ProcessorId>,
        callback: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> ObserverId {
        let mut observers = self.lock();
        let id = ObserverId(observers.next_id);
        observers.next_id += 1;
        observers.list.push(Observer {
            id,
            name: name.to_string(),
            sender,
            callback: Arc::new(callback),
        });
        id
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let before = observers.list.len();
        observers.list.retain(|o| o.id != id);
        observers.list.len() != before
    }

    /// Delivers `notification` to matching observers. Returns how many ran.
    pub fn post(&self, notification: &Notification) -> usize {
        let matching: Vec<ObserverFn> = self
            .lock()
            .list
            .iter()
            .filter(|o| o.name == notification.name)
            .filter(|o| o.sender.map_or(true, |s| s == notification.sender))
            .map(|o| o.callback.clone())
            .collect();
        for callback in &matching {
            callback(notification);
        }
        matching.len()
    }

    fn lock(&self) -> MutexGuard<'_, Observers> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{IMAGE_READY_NOTIFICATION, PROCESSING_ERROR_NOTIFICATION};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(center: &NotificationCenter, name: &str, sender: Option<ProcessorId>) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        center.add_observer(name, sender, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn test_post_reaches_observers_of_that_name() {
        let center = NotificationCenter::new();
        let ready = counter(&center, IMAGE_READY_NOTIFICATION, None);
        let failed = counter(&center, PROCESSING_ERROR_NOTIFICATION, None);

        let n = Notification::new(IMAGE_READY_NOTIFICATION, ProcessorId::next());
        assert_eq!(center.post(&n), 1);
        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sender_filter() {
        let center = NotificationCenter::new();
        let mine = ProcessorId::next();
        let theirs = ProcessorId::next();
        let hits = counter(&center, IMAGE_READY_NOTIFICATION, Some(mine));

        center.post(&Notification::new(IMAGE_READY_NOTIFICATION, theirs));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        center.post(&Notification::new(IMAGE_READY_NOTIFICATION, mine));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_observer() {
        let center = NotificationCenter::new();
        let id = center.add_observer(IMAGE_READY_NOTIFICATION, None, |_| {});
        assert!(center.remove_observer(id));
        assert!(!center.remove_observer(id));
        assert_eq!(
            center.post(&Notification::new(IMAGE_READY_NOTIFICATION, ProcessorId::next())),
            0
        );
    }

    #[test]
    fn test_payload_accessors() {
        let image = Arc::new(Image::filled(1, 1, 4, 1));
        let ready = Notification::new(IMAGE_READY_NOTIFICATION, ProcessorId::next())
            .with(BLURRED_IMAGE_KEY, NotificationValue::Image(image.clone()));
        assert!(Arc::ptr_eq(ready.blurred_image().unwrap(), &image));
        assert_eq!(ready.error_code(), None);

        let failed = Notification::new(PROCESSING_ERROR_NOTIFICATION, ProcessorId::next())
            .with(ERROR_CODE_KEY, NotificationValue::ErrorCode(-21771));
        assert_eq!(failed.error_code(), Some(-21771));
        assert!(failed.blurred_image().is_none());
    }

    #[test]
    fn test_observer_may_reenter_center() {
        let center = NotificationCenter::new();
        let inner = center.clone();
        center.add_observer(IMAGE_READY_NOTIFICATION, None, move |_| {
            inner.add_observer("other", None, |_| {});
        });
        center.post(&Notification::new(IMAGE_READY_NOTIFICATION, ProcessorId::next()));
    }
}
