//! Integration tests for the import pipeline
//!
//! Each test builds a generated project and its template as real git
//! repositories and runs `phases::import` between them.

mod common;

use std::path::Path;

use common::prelude::*;
use cookie_backport::error::Error;
use cookie_backport::phases::{import, Destination, ImportOptions, SelectionSpec};
use cookie_backport::variables::VariableFilter;
use git2::{Oid, RepositoryState, Signature};

fn options(fixture: &ImportFixture, selection: SelectionSpec) -> ImportOptions {
    let mut options = ImportOptions::new(fixture.project.path(), fixture.template.path());
    options.selection = selection;
    options
}

const WORKFLOW: &str = "\
name: Tests
jobs:
  tests:
    name: hypermodern-python ${{ matrix.python }}
    runs-on: ${{ matrix.os }}
    steps:
      - run: pip install hypermodern_python
";

const WORKFLOW_TEMPLATE: &str = "\
name: Tests
jobs:
  tests:
    name: {{cookiecutter.project_name}} ${{\"{{\"}} matrix.python {{\"}}\"}}
    runs-on: ${{\"{{\"}} matrix.os {{\"}}\"}}
    steps:
      - run: pip install {{cookiecutter.package_name}}
";

#[test]
fn test_import_head_rewrites_values_escapes_jinja_and_moves_paths() {
    let fixture = ImportFixture::new();
    let source = fixture
        .project
        .commit(&[(".github/workflows/tests.yml", WORKFLOW)], "Add tests workflow");

    let report = import(&options(&fixture, SelectionSpec::default())).unwrap();

    assert_eq!(report.branch, "main");
    assert_eq!(report.commits.len(), 1);
    assert_eq!(report.commits[0].source, source);

    let path = ImportFixture::templated(".github/workflows/tests.yml");
    assert_eq!(
        fixture.template.file_at("HEAD", &path).as_deref(),
        Some(WORKFLOW_TEMPLATE)
    );
    // Checked out, too.
    assert_eq!(fixture.template.read(&path), WORKFLOW_TEMPLATE);

    let head = fixture.template.repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(Some(head.id()), report.commits[0].integrated);
    assert_eq!(head.message(), Some("Add tests workflow"));
    assert_eq!(head.author().name(), Some("Jane Developer"));
    assert_eq!(head.committer().name(), Some("Template Maintainer"));
    assert_eq!(fixture.template.repo.state(), RepositoryState::Clean);
}

#[test]
fn test_import_branch_preserves_order() {
    let fixture = ImportFixture::new();
    fixture.project.checkout_new("topic");
    fixture.project.commit(
        &[("README.md", "# hypermodern-python\n\nBy Jane Developer.\n\nSee the docs.\n")],
        "Mention the docs",
    );
    fixture.project.commit(
        &[("docs/usage.md", "Run `python -m hypermodern_python`.\n")],
        "Add usage",
    );
    fixture.project.checkout("main");

    let report = import(&options(&fixture, SelectionSpec::branch("topic", "main"))).unwrap();
    assert_eq!(report.integrated().count(), 2);

    let template = &fixture.template;
    assert_eq!(template.commit_count(), 3);
    assert_eq!(
        template.file_at("HEAD", &ImportFixture::templated("README.md")).as_deref(),
        Some("# {{cookiecutter.project_name}}\n\nBy {{cookiecutter.author}}.\n\nSee the docs.\n")
    );
    assert_eq!(
        template
            .file_at("HEAD", &ImportFixture::templated("docs/usage.md"))
            .as_deref(),
        Some("Run `python -m {{cookiecutter.package_name}}`.\n")
    );

    let head = template.repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.summary(), Some("Add usage"));
    assert_eq!(head.parent(0).unwrap().summary(), Some("Mention the docs"));
}

#[test]
fn test_import_onto_new_branch() {
    let fixture = ImportFixture::new();
    fixture.project.checkout_new("topic");
    fixture
        .project
        .commit(&[("CHANGELOG.md", "hypermodern-python 1.0\n")], "Add changelog");

    let main_before = fixture.template.head();
    let mut options = options(&fixture, SelectionSpec::branch("topic", "main"));
    options.target = Destination::Create("topic".to_string());
    let report = import(&options).unwrap();

    assert_eq!(report.branch, "topic");
    assert_eq!(fixture.template.branch_tip("main"), Some(main_before));
    assert_eq!(fixture.template.branch_tip("topic"), report.commits[0].integrated);
    assert_eq!(
        fixture.template.repo.head().unwrap().shorthand(),
        Some("topic")
    );

    // The branch exists now, so creating it again fails before anything is written.
    let error = import(&options).unwrap_err();
    assert!(matches!(error, Error::Destination { .. }));
}

#[test]
fn test_rewriting_is_deterministic() {
    let fixture = ImportFixture::new();
    fixture.project.commit(
        &[(".github/workflows/tests.yml", WORKFLOW)],
        "Add tests workflow",
    );

    let first = import(&options(&fixture, SelectionSpec::default())).unwrap();

    let other = ImportFixture {
        project: GitRepo::new(),
        template: GitRepo::new(),
    };
    other.template.commit_as(
        &[
            ("cookiecutter.json", TEMPLATE_DECLARATION),
            (
                "{{cookiecutter.project_name}}/README.md",
                "# {{cookiecutter.project_name}}\n\nBy {{cookiecutter.author}}.\n",
            ),
            (
                "{{cookiecutter.project_name}}/src/{{cookiecutter.package_name}}/__init__.py",
                "\"\"\"{{cookiecutter.project_name}}.\"\"\"\n",
            ),
        ],
        "Initial template",
        "Template Maintainer",
        "maintainer@example.com",
    );
    let second = import(&ImportOptions {
        destination: other.template.path().to_path_buf(),
        ..options(&fixture, SelectionSpec::default())
    })
    .unwrap();

    assert_eq!(first.commits[0].rewritten, second.commits[0].rewritten);
    let tree = |repo: &GitRepo| repo.repo.head().unwrap().peel_to_tree().unwrap().id();
    assert_eq!(tree(&fixture.template), tree(&other.template));
}

#[test]
fn test_conflict_keeps_earlier_commits_and_stops() {
    let fixture = ImportFixture::new();
    let base = fixture.project.head();
    fixture
        .project
        .commit(&[("docs/one.md", "one\n")], "Add page one");
    let conflicting = fixture.project.commit(
        &[("README.md", "# hypermodern-python\n\nBy Jane Developer and friends.\n")],
        "Credit friends",
    );
    fixture
        .project
        .commit(&[("docs/two.md", "two\n")], "Add page two");

    fixture.template.commit_as(
        &[(
            "{{cookiecutter.project_name}}/README.md",
            "# {{cookiecutter.project_name}}\n\nBy {{cookiecutter.author}} et al.\n",
        )],
        "Credit everyone",
        "Template Maintainer",
        "maintainer@example.com",
    );
    let template_tip = fixture.template.head();

    let selection = SelectionSpec::revisions([format!("{base}..HEAD")]);
    let error = import(&options(&fixture, selection)).unwrap_err();

    match &error {
        Error::Conflict {
            source_commit,
            branch,
            paths,
            ..
        } => {
            assert!(conflicting.to_string().starts_with(source_commit.as_str()));
            assert_eq!(branch, "main");
            assert_eq!(paths, &vec![ImportFixture::templated("README.md")]);
        }
        other => panic!("expected a conflict, got {other}"),
    }
    assert_eq!(error.exit_code(), cookie_backport::exit_codes::CONFLICT);

    let template = &fixture.template;
    // Commit one is integrated, commit three is not.
    let head = template.repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.summary(), Some("Add page one"));
    assert_eq!(head.parent_id(0).unwrap(), template_tip);
    assert!(template
        .file_at("HEAD", &ImportFixture::templated("docs/two.md"))
        .is_none());

    assert_eq!(template.repo.state(), RepositoryState::CherryPick);
    assert!(template.path().join(".git/CHERRY_PICK_HEAD").exists());
    let readme = template.read(&ImportFixture::templated("README.md"));
    assert!(readme.contains("<<<<<<<"));
    assert!(readme.contains(">>>>>>>"));
}

#[test]
fn test_commit_without_changes_is_skipped() {
    let fixture = ImportFixture::new();
    fixture.template.commit_as(
        &[("{{cookiecutter.project_name}}/LICENSE", "MIT License\n")],
        "Add license",
        "Template Maintainer",
        "maintainer@example.com",
    );
    let tip = fixture.template.head();
    let source = fixture
        .project
        .commit(&[("LICENSE", "MIT License\n")], "Add license");

    let report = import(&options(&fixture, SelectionSpec::default())).unwrap();

    assert_eq!(report.integrated().count(), 0);
    assert_eq!(report.skipped().next().unwrap().source, source);
    assert_eq!(fixture.template.head(), tip);
    assert_eq!(fixture.template.repo.state(), RepositoryState::Clean);
}

#[test]
fn test_merge_commits_are_picked_against_first_parent() {
    let fixture = ImportFixture::new();
    let project = &fixture.project;
    let base = project.head();

    project.checkout_new("topic");
    let topic = project.commit(&[("docs/topic.md", "topic\n")], "Add topic page");
    project.checkout("main");
    let main = project.commit(&[("docs/main.md", "main\n")], "Add main page");

    let ours = project.repo.find_commit(main).unwrap();
    let theirs = project.repo.find_commit(topic).unwrap();
    let mut index = project.repo.merge_commits(&ours, &theirs, None).unwrap();
    let tree_id = index.write_tree_to(&project.repo).unwrap();
    let tree = project.repo.find_tree(tree_id).unwrap();
    let signature = Signature::now("Jane Developer", "jane@example.com").unwrap();
    let merge: Oid = project
        .repo
        .commit(
            Some("HEAD"),
            &signature,
            &signature,
            "Merge branch 'topic'",
            &tree,
            &[&ours, &theirs],
        )
        .unwrap();

    let selection = SelectionSpec::revisions([format!("{base}..{merge}")]);
    let report = import(&options(&fixture, selection)).unwrap();

    assert_eq!(report.commits.len(), 3);
    assert_eq!(report.commits.last().unwrap().source, merge);
    // The merge adds nothing beyond the two picked commits.
    assert!(report.commits.last().unwrap().integrated.is_none());

    let template = &fixture.template;
    assert!(template
        .file_at("HEAD", &ImportFixture::templated("docs/topic.md"))
        .is_some());
    assert!(template
        .file_at("HEAD", &ImportFixture::templated("docs/main.md"))
        .is_some());
}

#[test]
fn test_binary_files_pass_through() {
    let fixture = ImportFixture::new();
    let logo: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0hypermodern-python{{";
    fixture.project.write_bytes("docs/logo.png", logo);
    fixture
        .project
        .commit_all("Add logo", "Jane Developer", "jane@example.com");

    import(&options(&fixture, SelectionSpec::default())).unwrap();

    let path = fixture
        .template
        .path()
        .join(ImportFixture::templated("docs/logo.png"));
    assert_eq!(std::fs::read(path).unwrap(), logo);
}

#[test]
fn test_excluded_variable_stays_literal() {
    let fixture = ImportFixture::new();
    fixture.project.commit(
        &[("AUTHORS", "Jane Developer wrote hypermodern-python\n")],
        "Add authors",
    );

    let mut options = options(&fixture, SelectionSpec::default());
    options.filter = VariableFilter {
        include: Vec::new(),
        exclude: vec!["author".to_string()],
    };
    import(&options).unwrap();

    assert_eq!(
        fixture
            .template
            .file_at("HEAD", &ImportFixture::templated("AUTHORS"))
            .as_deref(),
        Some("Jane Developer wrote {{cookiecutter.project_name}}\n")
    );
}

#[test]
fn test_unknown_variable_in_filter_is_rejected_with_hint() {
    let fixture = ImportFixture::new();
    fixture.project.commit(&[("AUTHORS", "Jane\n")], "Add authors");
    let tip = fixture.template.head();

    let mut options = options(&fixture, SelectionSpec::default());
    options.filter.include = vec!["autor".to_string()];
    let error = import(&options).unwrap_err();

    assert!(matches!(error, Error::Configuration { .. }));
    assert!(error.to_string().contains("Did you mean 'author'?"));
    assert_eq!(fixture.template.head(), tip);
}

#[test]
fn test_missing_recorded_values_is_configuration_error() {
    let fixture = ImportFixture {
        project: GitRepo::new(),
        template: ImportFixture::new().template,
    };
    fixture
        .project
        .commit(&[("README.md", "# hypermodern-python\n")], "Initial commit");
    let tip = fixture.template.head();

    let error = import(&options(&fixture, SelectionSpec::default())).unwrap_err();

    assert!(matches!(error, Error::Configuration { .. }));
    assert!(error.to_string().contains(".cookiecutter.json"));
    assert_eq!(fixture.template.head(), tip);
}

#[test]
fn test_template_without_root_directory_is_configuration_error() {
    let fixture = ImportFixture {
        project: ImportFixture::new().project,
        template: GitRepo::new(),
    };
    fixture
        .template
        .commit(&[("README.md", "not a template\n")], "Initial commit");

    let error = import(&options(&fixture, SelectionSpec::default())).unwrap_err();
    assert!(matches!(error, Error::Configuration { .. }));
}

#[test]
fn test_dirty_destination_is_refused() {
    let fixture = ImportFixture::new();
    fixture.project.commit(&[("docs/a.md", "a\n")], "Add a");
    fixture
        .template
        .write("{{cookiecutter.project_name}}/README.md", "local edit\n");

    let error = import(&options(&fixture, SelectionSpec::default())).unwrap_err();

    assert!(matches!(error, Error::Destination { .. }));
    assert_eq!(
        fixture.template.read("{{cookiecutter.project_name}}/README.md"),
        "local edit\n"
    );
}

#[test]
fn test_unknown_revision_is_selection_error() {
    let fixture = ImportFixture::new();
    let error = import(&options(
        &fixture,
        SelectionSpec::revisions(["does-not-exist"]),
    ))
    .unwrap_err();

    assert!(matches!(error, Error::Selection { .. }));
    assert!(!Path::new(&fixture.template.path().join(".git/CHERRY_PICK_HEAD")).exists());
}
