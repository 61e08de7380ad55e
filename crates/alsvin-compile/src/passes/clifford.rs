//! Clifford simplification (reserved).

use alsvin_ir::Circuit;

use crate::error::CompileResult;
use crate::pass::Pass;

/// Reserved slot in the level-2 pipeline for tableau-based Clifford
/// simplification. Currently a no-op.
pub struct CliffordSimplification;

impl Pass for CliffordSimplification {
    fn name(&self) -> &'static str {
        "CliffordSimplification"
    }

    fn run(&self, _circuit: &mut Circuit) -> CompileResult<()> {
        Ok(())
    }
}
