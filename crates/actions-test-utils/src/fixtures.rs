//! Canned remote entities and log archives.

use std::io::{Cursor, Write};

use actions_client::{Account, Repository, Workflow, WorkflowRun};
use zip::write::{SimpleFileOptions, ZipWriter};

/// A public repository owned by `owner`.
pub fn repository(owner: &str, name: &str) -> Repository {
    Repository {
        id: 1296269,
        name: name.to_string(),
        full_name: format!("{}/{}", owner, name),
        owner: Account {
            login: owner.to_string(),
        },
        description: Some(format!("The {} repository", name)),
        private: false,
        html_url: format!("https://github.com/{}/{}", owner, name),
        default_branch: Some("main".to_string()),
        language: Some("Rust".to_string()),
        stargazers_count: 80,
        forks_count: 9,
        open_issues_count: 2,
    }
}

/// An active workflow defined in `.github/workflows/{file}`.
pub fn workflow(id: u64, name: &str, file: &str) -> Workflow {
    Workflow {
        id,
        name: name.to_string(),
        path: format!(".github/workflows/{}", file),
        state: "active".to_string(),
        html_url: None,
    }
}

/// A run of `CI` with the given status and conclusion.
pub fn workflow_run(id: u64, status: &str, conclusion: Option<&str>) -> WorkflowRun {
    WorkflowRun {
        id,
        name: Some("CI".to_string()),
        status: Some(status.to_string()),
        conclusion: conclusion.map(str::to_string),
        head_branch: Some("main".to_string()),
        head_sha: "009b8a3a9ccbb128af87f9b1c0f4c62e8a304f6d".to_string(),
        event: "push".to_string(),
        run_number: id % 1000,
        html_url: format!("https://github.com/acme/widgets/actions/runs/{}", id),
        created_at: Some("2026-01-01T00:00:00Z".to_string()),
        updated_at: Some("2026-01-01T00:05:00Z".to_string()),
    }
}

/// Build a zip archive in memory with one file per `(name, contents)` pair,
/// written in the given order.
pub fn log_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        writer
            .start_file(*name, options)
            .expect("failed to start archive entry");
        writer
            .write_all(contents.as_bytes())
            .expect("failed to write archive entry");
    }
    writer
        .finish()
        .expect("failed to finish archive")
        .into_inner()
}
