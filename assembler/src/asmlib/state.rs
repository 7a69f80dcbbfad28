use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// Where an assembly run has got to.  A `*Failed` phase still leaves
/// a populated (if imperfect) session behind, because each phase
/// processes every line before the next phase starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum AssemblyPhase {
    #[default]
    NotStarted,
    ParsingLines,
    ParseFailed,
    ParseComplete,
    Pass1Running,
    Pass1Failed,
    Pass1Complete,
    Pass2Running,
    Pass2Failed,
    Complete,
}

impl AssemblyPhase {
    /// The phase which follows this one when it finishes, given
    /// whether it raised an error.  Finished phases move on to
    /// running the next one.
    #[must_use]
    pub fn next(self, failed: bool) -> AssemblyPhase {
        use AssemblyPhase::*;
        match (self, failed) {
            (NotStarted, _) => ParsingLines,
            (ParsingLines, true) => ParseFailed,
            (ParsingLines, false) => ParseComplete,
            (ParseFailed | ParseComplete, _) => Pass1Running,
            (Pass1Running, true) => Pass1Failed,
            (Pass1Running, false) => Pass1Complete,
            (Pass1Failed | Pass1Complete, _) => Pass2Running,
            (Pass2Running, true) => Pass2Failed,
            (Pass2Running, false) | (Complete, _) => Complete,
            (Pass2Failed, _) => Pass2Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            AssemblyPhase::ParseFailed | AssemblyPhase::Pass1Failed | AssemblyPhase::Pass2Failed
        )
    }

    /// True once pass 2 has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, AssemblyPhase::Pass2Failed | AssemblyPhase::Complete)
    }
}

impl Display for AssemblyPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[test]
fn test_clean_run() {
    let mut phase = AssemblyPhase::default();
    let mut seen = vec![phase];
    while !phase.is_finished() {
        phase = phase.next(false);
        seen.push(phase);
    }
    assert_eq!(
        seen,
        vec![
            AssemblyPhase::NotStarted,
            AssemblyPhase::ParsingLines,
            AssemblyPhase::ParseComplete,
            AssemblyPhase::Pass1Running,
            AssemblyPhase::Pass1Complete,
            AssemblyPhase::Pass2Running,
            AssemblyPhase::Complete,
        ]
    );
}

#[test]
fn test_failed_phases_continue() {
    let phase = AssemblyPhase::ParsingLines.next(true);
    assert_eq!(phase, AssemblyPhase::ParseFailed);
    assert!(phase.is_failed());
    assert_eq!(phase.next(false), AssemblyPhase::Pass1Running);
    assert_eq!(
        AssemblyPhase::Pass2Running.next(true),
        AssemblyPhase::Pass2Failed
    );
}
