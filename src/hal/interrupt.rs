//! Periodic interrupt masking

/// Control over the periodic (vblank) interrupt
pub trait Interrupts {
    fn disable(&self);
    fn enable(&self);

    /// Clears every pending interrupt request
    fn acknowledge_all(&self);

    /// Masks the interrupt until the returned guard is dropped
    fn suppress(&self) -> Suppressed<'_, Self>
    where
        Self: Sized,
    {
        self.disable();
        Suppressed { irq: self }
    }
}

/// Keeps the periodic interrupt masked; re-arms it when dropped
pub struct Suppressed<'a, I: Interrupts> {
    irq: &'a I,
}

impl<I: Interrupts> Suppressed<'_, I> {
    /// Re-arms early, e.g. before waiting on the operator
    pub fn rearm(self) {}
}

impl<I: Interrupts> Drop for Suppressed<'_, I> {
    fn drop(&mut self) {
        self.irq.acknowledge_all();
        self.irq.enable();
    }
}
