/// Exit codes `lscm annotate` uses for files it has nothing to say about:
/// not shared, not in a sandbox, or outside the loaded components.
pub const UNTRACKED_EXIT_CODES: [i32; 3] = [1, 3, 30];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    SkipUntracked,
    Failure,
}

impl ExitClass {
    pub fn classify(exit_code: i32) -> Self {
        if exit_code == 0 {
            ExitClass::Success
        } else if UNTRACKED_EXIT_CODES.contains(&exit_code) {
            ExitClass::SkipUntracked
        } else {
            ExitClass::Failure
        }
    }
}
