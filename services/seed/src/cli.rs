//! Command-line arguments of the `seed` and `smoke` binaries

use clap::{Args, Parser};

/// Backend selection shared by both binaries
#[derive(Args, Debug, Clone, Copy, Default, PartialEq)]
pub struct BackendArgs {
    /// Run against the in-process backend instead of the hosted one.
    #[arg(long)]
    pub memory: bool,
}

#[derive(Parser, Debug)]
#[command(name = "seed")]
#[command(about = "Load the demo user and sample catalog", long_about = None)]
pub struct SeedCli {
    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Parser, Debug)]
#[command(name = "smoke")]
#[command(about = "Run the end-to-end smoke suite against the catalog", long_about = None)]
pub struct SmokeCli {
    #[command(flatten)]
    pub backend: BackendArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn memory_flag_is_parsed() {
        let cli = SmokeCli::try_parse_from(["smoke", "--memory"]).unwrap();
        assert!(cli.backend.memory);

        let cli = SeedCli::try_parse_from(["seed"]).unwrap();
        assert!(!cli.backend.memory);
    }

    #[test]
    fn misspelled_flag_is_rejected() {
        let err = SeedCli::try_parse_from(["seed", "--memroy"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let err = SmokeCli::try_parse_from(["smoke", "extra"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_is_available() {
        let err = SmokeCli::try_parse_from(["smoke", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
