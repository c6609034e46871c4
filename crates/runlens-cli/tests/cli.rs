use assert_cmd::Command;
use predicates::prelude::*;

fn runlens() -> Command {
    let mut cmd = Command::cargo_bin("runlens").expect("binary builds");
    cmd.env_remove("WANDB_API_KEY").env_remove("WANDB_BASE_URL");
    cmd
}

#[test]
fn help_names_both_subcommands() {
    runlens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn tools_lists_every_tool_without_a_credential() {
    runlens()
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("list_projects"))
        .stdout(predicate::str::contains("list_runs"))
        .stdout(predicate::str::contains("list_metrics"))
        .stdout(predicate::str::contains("plot_run_metrics"))
        .stdout(predicate::str::contains("get_run_details"));
}

#[test]
fn serve_without_credential_fails_before_any_io() {
    runlens()
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WANDB_API_KEY"));
}
