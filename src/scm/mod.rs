pub mod blame;
pub mod command;
pub mod consumer;
pub mod exit_code;
pub mod input;
pub mod matcher;
pub mod timestamp;
pub mod workspace;

pub use blame::{BlameCommand, BlameOutput, BlameReport, FileBlame, FileOutcome};
pub use command::{CommandExecutor, CommandLine, InvocationOutcome, ProcessExecutor};
pub use input::{BlameInput, InputFile};
pub use workspace::{SharedWorkspace, Workspace};
