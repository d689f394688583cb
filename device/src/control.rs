//! CPU-level side effects of `P_JUMP` / `P_CALL`: the RISC-V core itself
//! is an external collaborator outside the wire protocol's scope, but the
//! dispatcher needs a seam to invoke them through.

pub trait ControlOps {
    fn disable_interrupts(&mut self);
    /// Memory fence, issued before transferring control so outstanding
    /// writes (e.g. from a preceding `WDATA`) are visible to the code
    /// about to run.
    fn fence(&mut self);
    /// Invoke `addr` as `void(*)()` and resume here on return.
    fn call(&mut self, addr: u32);
    /// Transfer control to `addr` as a second-stage boot entry. Real
    /// firmware never returns from this; it is not `-> !` here so the
    /// dispatcher stays testable against a mock that does return.
    fn jump(&mut self, addr: u32);
}
