//! Run-mode detection against a real `.env` file.
//!
//! Changes the working directory and process environment, so it keeps to one test.

use tempfile::tempdir;

use metis_token_bot::config::RunMode;

#[test]
fn test_cli_mode_can_come_from_dotenv_file() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "CLI_MODE=true\n").unwrap();
    std::env::remove_var("CLI_MODE");
    std::env::set_current_dir(dir.path()).unwrap();

    assert_eq!(RunMode::from_env(vec!["token_bot".to_string()]), RunMode::Cli);
    assert_eq!(std::env::var("CLI_MODE").as_deref(), Ok("true"));
}
