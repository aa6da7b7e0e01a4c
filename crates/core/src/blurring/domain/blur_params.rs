/// Radius and iteration count of one blur request.
///
/// `radius` is the box kernel width in pixels and `iterations` the number
/// of successive box passes. Either being zero means "no blur": the result
/// is an unmodified copy of the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlurParams {
    pub radius: u32,
    pub iterations: u8,
}

impl BlurParams {
    pub fn new(radius: u32, iterations: u8) -> Self {
        Self { radius, iterations }
    }

    /// Box kernels need an odd width, so even radii are bumped by one.
    ///
    /// Zero stays zero; it is the pass-through marker, not a kernel width.
    pub fn normalized(self) -> Self {
        let radius = if self.radius != 0 && self.radius % 2 == 0 {
            self.radius + 1
        } else {
            self.radius
        };
        Self {
            radius,
            iterations: self.iterations,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.radius == 0 || self.iterations == 0
    }
}
