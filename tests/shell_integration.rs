//! Drives the whole tool server (config, invoker, shell) with scripted input.

use std::io::Cursor;
use std::sync::Arc;

use parking_lot::Mutex;

use toolshell::cli_interface::{MemoryPresenter, ScriptedReader, ShellExit, StreamReader, TerminalSignal};
use toolshell::common::{handler_fn, CommandEntry};
use toolshell::{ServerOptions, ToolServer};

type Calls = Arc<Mutex<Vec<(String, Vec<String>)>>>;

fn recorder(name: &str, calls: &Calls) -> CommandEntry {
    let calls = calls.clone();
    let label = name.to_string();
    CommandEntry::new(
        name,
        format!("records {}", name),
        handler_fn(move |_ctx, args| {
            let calls = calls.clone();
            let label = label.clone();
            async move {
                calls.lock().push((label, args));
                Ok(())
            }
        }),
    )
}

fn server_from_file(contents: &str) -> (ToolServer, Arc<MemoryPresenter>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("toolshell.toml");
    std::fs::write(&path, contents).expect("write config");

    let options = ServerOptions {
        config_path: Some(path),
        ..ServerOptions::default()
    };
    let manager = ToolServer::load_config(&options).expect("load config");

    let presenter = Arc::new(MemoryPresenter::new());
    let server = ToolServer::new(manager, presenter.clone());
    (server, presenter, dir)
}

#[tokio::test]
async fn scripted_session_through_queued_invoker() {
    let (mut server, presenter, _dir) = server_from_file(
        r#"
prompt = "tool> "

[invoker]
kind = "queued"
workers = 2
queue_depth = 4
audit = true
"#,
    );
    assert_eq!(server.config().prompt, "tool> ");
    assert_eq!(server.invoker().name(), "audited");

    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    server
        .register(recorder("show version", &calls))
        .register(recorder("list", &calls));

    let mut reader = ScriptedReader::from_lines([
        "show version",
        "",
        "list extra args",
        "unknown",
        "exit",
        "list",
    ]);
    let exit = server.run(&mut reader).await;

    assert_eq!(exit, ShellExit::Terminate(TerminalSignal::Exit));
    assert_eq!(
        calls.lock().clone(),
        vec![
            ("show version".to_string(), Vec::<String>::new()),
            (
                "list".to_string(),
                vec!["extra".to_string(), "args".to_string()]
            ),
        ]
    );
    assert_eq!(presenter.outcomes().len(), 2);
    assert_eq!(presenter.diagnostics(), vec!["command not found".to_string()]);
    assert!(!reader.is_exhausted());
}

#[tokio::test]
async fn piped_input_ends_with_end_of_input() {
    let (mut server, presenter, _dir) = server_from_file("show_results = true\n");

    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    server.register(recorder("list", &calls));

    let mut reader = StreamReader::new(Cursor::new("list a\nhelp list\n"));
    let exit = server.run(&mut reader).await;

    assert_eq!(exit, ShellExit::Terminate(TerminalSignal::EndOfInput));
    assert_eq!(calls.lock().len(), 1);

    let help = presenter.output();
    assert_eq!(help.len(), 1);
    assert_eq!(help[0], "    list                 - records list");
}

#[tokio::test]
async fn stop_token_ends_loop_without_terminating() {
    let (mut server, _presenter, _dir) = server_from_file("");

    server.stop_token().cancel();
    let mut reader = ScriptedReader::from_lines(["version"]);
    let exit = server.run(&mut reader).await;

    assert_eq!(exit, ShellExit::Stopped);
    assert_eq!(exit.terminal_signal(), None);
    assert_eq!(reader.reads(), 0);
}

#[test]
fn invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("toolshell.toml");
    std::fs::write(&path, "dispatch_timeout_secs = 0\n").expect("write config");

    let options = ServerOptions {
        config_path: Some(path),
        ..ServerOptions::default()
    };
    assert!(ToolServer::load_config(&options).is_err());
}
