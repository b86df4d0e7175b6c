use loopseq_scheduler::NoteFiring;

/// Receives the firings of every scheduling pass and turns them into sound.
///
/// A firing is due at `transport_origin + firing.song_time` on the
/// transport clock. Called with the scheduler lock held, so implementations
/// should hand work off rather than block.
pub trait Renderer: Send + 'static {
    fn on_firings_ready(&mut self, firings: &[NoteFiring], transport_origin: f64);

    /// Silences anything still sounding. Called when playback stops.
    fn stop_all(&mut self) {}
}

impl<F> Renderer for F
where
    F: FnMut(&[NoteFiring], f64) + Send + 'static,
{
    fn on_firings_ready(&mut self, firings: &[NoteFiring], transport_origin: f64) {
        self(firings, transport_origin)
    }
}
