//! Diagnostics printer

use crate::diagnostics::Diagnostics;

/// Print diagnostics to stderr, warnings and errors alike
pub fn output_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("\n{}", diagnostic);
    }
}
