use embedded_hal::delay::DelayNs;

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct Delay {
    delays_ms: Vec<u32>,
    delays_ns: Vec<u32>,
}

impl Delay {
    pub fn new() -> Delay {
        Delay::default()
    }

    pub fn get_delays_ms(&self) -> &[u32] {
        self.delays_ms.as_slice()
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}
