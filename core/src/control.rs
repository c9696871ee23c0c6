/// Input capability consumed by the engine.
pub trait Control {
    /// True once the host wants the emulation loop to stop
    fn is_closed(&mut self) -> bool;

    /// Whether hex key `key` (0x0..=0xF) is currently held down
    fn is_pressed(&mut self, key: u8) -> bool;
}
