use anyhow::Context;
use clap::{Arg, Command};
use coursedoc_backend::{BackendConfig, RestBackend};
use coursedoc_core::{AuthorizedUser, Console, DocumentLocator, FileUpload, Viewer};
use coursedoc_model::{
    CourseDraft, CourseId, DocumentId, LessonDraft, LessonId, LevelDraft, LevelId, StudentFilter,
    StudentId,
};
use std::sync::Arc;

/// Environment variable carrying the operator email
const ENV_EMAIL: &str = "COURSEDOC_EMAIL";
/// Environment variable carrying the operator password
const ENV_PASSWORD: &str = "COURSEDOC_PASSWORD";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn draft_args(command: Command) -> Command {
    command
        .arg(Arg::new("name").long("name").required(true).help("Display name"))
        .arg(
            Arg::new("description")
                .long("description")
                .default_value("")
                .help("Free-text description"),
        )
}

fn build_cli() -> Command {
    Command::new("coursedoc")
        .version(coursedoc_core::VERSION)
        .about("Course-content administration console")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .default_value("coursedoc.toml")
                .help("Path to the backend configuration file"),
        )
        .subcommand(Command::new("tree").about("Print the full course hierarchy"))
        .subcommand(
            Command::new("course")
                .about("Manage courses")
                .subcommand_required(true)
                .subcommand(draft_args(Command::new("create").about("Create a course")))
                .subcommand(draft_args(
                    Command::new("update")
                        .about("Update a course")
                        .arg(id_arg("course", "Course id")),
                ))
                .subcommand(
                    Command::new("delete")
                        .about("Delete a course and everything under it")
                        .arg(id_arg("course", "Course id")),
                ),
        )
        .subcommand(
            Command::new("level")
                .about("Manage levels")
                .subcommand_required(true)
                .subcommand(draft_args(
                    Command::new("create")
                        .about("Create a level")
                        .arg(id_arg("course", "Course id")),
                ))
                .subcommand(draft_args(
                    Command::new("update")
                        .about("Update a level")
                        .arg(id_arg("course", "Course id"))
                        .arg(id_arg("level", "Level id")),
                ))
                .subcommand(
                    Command::new("delete")
                        .about("Delete a level and its lessons")
                        .arg(id_arg("course", "Course id"))
                        .arg(id_arg("level", "Level id")),
                ),
        )
        .subcommand(
            Command::new("lesson")
                .about("Manage lessons")
                .subcommand_required(true)
                .subcommand(
                    draft_args(
                        Command::new("create")
                            .about("Create a lesson")
                            .arg(id_arg("course", "Course id"))
                            .arg(id_arg("level", "Level id")),
                    )
                    .arg(
                        Arg::new("number")
                            .long("number")
                            .default_value("")
                            .help("Lesson number label"),
                    ),
                )
                .subcommand(
                    draft_args(
                        Command::new("update")
                            .about("Update a lesson")
                            .arg(id_arg("course", "Course id"))
                            .arg(id_arg("level", "Level id"))
                            .arg(id_arg("lesson", "Lesson id")),
                    )
                    .arg(
                        Arg::new("number")
                            .long("number")
                            .default_value("")
                            .help("Lesson number label"),
                    ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a lesson and its documents")
                        .arg(id_arg("course", "Course id"))
                        .arg(id_arg("level", "Level id"))
                        .arg(id_arg("lesson", "Lesson id")),
                ),
        )
        .subcommand(
            Command::new("document")
                .about("Manage lesson documents")
                .subcommand_required(true)
                .subcommand(
                    Command::new("upload")
                        .about("Upload files to a lesson, one at a time")
                        .arg(id_arg("course", "Course id"))
                        .arg(id_arg("level", "Level id"))
                        .arg(id_arg("lesson", "Lesson id"))
                        .arg(
                            Arg::new("files")
                                .num_args(1..)
                                .required(true)
                                .help("Files to upload"),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete one document and its storage object")
                        .arg(id_arg("course", "Course id"))
                        .arg(id_arg("level", "Level id"))
                        .arg(id_arg("lesson", "Lesson id"))
                        .arg(id_arg("document", "Document id")),
                )
                .subcommand(
                    Command::new("view")
                        .about("Print a document's download URL and record the view")
                        .arg(id_arg("course", "Course id"))
                        .arg(id_arg("level", "Level id"))
                        .arg(id_arg("lesson", "Lesson id"))
                        .arg(id_arg("document", "Document id")),
                ),
        )
        .subcommand(
            Command::new("access")
                .about("Edit a document's student access list")
                .arg(id_arg("course", "Course id"))
                .arg(id_arg("level", "Level id"))
                .arg(id_arg("lesson", "Lesson id"))
                .arg(id_arg("document", "Document id"))
                .arg(
                    Arg::new("students")
                        .long("students")
                        .default_value("")
                        .help("Comma-separated student ids; empty locks the document"),
                ),
        )
        .subcommand(
            Command::new("view-log")
                .about("Show a document's view history, newest first")
                .arg(id_arg("course", "Course id"))
                .arg(id_arg("level", "Level id"))
                .arg(id_arg("lesson", "Lesson id"))
                .arg(id_arg("document", "Document id")),
        )
        .subcommand(
            Command::new("students")
                .about("List assignable students")
                .arg(Arg::new("search").long("search").help("Name/email substring"))
                .arg(Arg::new("class").long("class").help("Legacy class id")),
        )
        .subcommand(
            Command::new("import")
                .about("Import legacy classes as courses (read-only on the source)"),
        )
}

async fn connect(config_path: &str) -> anyhow::Result<(Console, AuthorizedUser)> {
    let config = BackendConfig::load(config_path)
        .with_context(|| format!("loading backend config from {config_path}"))?;
    tracing::debug!(api_base = %config.api_base, project = %config.project_id, "connecting");
    let backend = Arc::new(RestBackend::new(config));
    let console = Console::new(backend.clone(), backend.clone(), backend);

    let email = std::env::var(ENV_EMAIL).with_context(|| format!("{ENV_EMAIL} not set"))?;
    let password =
        std::env::var(ENV_PASSWORD).with_context(|| format!("{ENV_PASSWORD} not set"))?;
    let user = console.session().sign_in(&email, &password).await?;
    println!("Signed in as {} ({:?})", user.display_name, user.role);
    Ok((console, user))
}

fn draft_of(args: &clap::ArgMatches) -> (String, String) {
    (
        args.get_one::<String>("name").cloned().unwrap_or_default(),
        args.get_one::<String>("description")
            .cloned()
            .unwrap_or_default(),
    )
}

fn course_of(args: &clap::ArgMatches) -> CourseId {
    CourseId::new(args.get_one::<String>("course").unwrap().clone())
}

fn level_of(args: &clap::ArgMatches) -> LevelId {
    LevelId::new(args.get_one::<String>("level").unwrap().clone())
}

fn lesson_of(args: &clap::ArgMatches) -> LessonId {
    LessonId::new(args.get_one::<String>("lesson").unwrap().clone())
}

fn document_of(args: &clap::ArgMatches) -> DocumentId {
    DocumentId::new(args.get_one::<String>("document").unwrap().clone())
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("mp4") => "video/mp4",
        Some("doc" | "docx") => "application/msword",
        Some("xls" | "xlsx") => "application/vnd.ms-excel",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

async fn run() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    let config_path = matches.get_one::<String>("config").unwrap().clone();

    match matches.subcommand() {
        Some(("tree", _)) => {
            let (console, _user) = connect(&config_path).await?;
            let tree = console.hierarchy().load_hierarchy().await?;
            if tree.is_empty() {
                println!("No courses yet");
                return Ok(());
            }
            for course in &tree {
                println!("{} [{}]", course.name, course.id);
                for level in &course.levels {
                    println!("  {} [{}]  {} lessons", level.name, level.id, level.lessons.len());
                    for lesson in &level.lessons {
                        println!(
                            "    Lesson {}: {} [{}]  {} documents",
                            lesson.lesson_number,
                            lesson.name,
                            lesson.id,
                            lesson.documents.len()
                        );
                        for doc in &lesson.documents {
                            let badge = if doc.access.is_locked() {
                                "locked (all students)".to_string()
                            } else {
                                format!("unlocked for {} student(s)", doc.access.granted().len())
                            };
                            println!("      {} [{}]  {}", doc.name, doc.id, badge);
                        }
                    }
                }
            }
        }
        Some(("course", sub)) => {
            let (console, _user) = connect(&config_path).await?;
            match sub.subcommand() {
                Some(("create", args)) => {
                    let (name, description) = draft_of(args);
                    let id = console
                        .hierarchy()
                        .create_course(&CourseDraft::new(name, description))
                        .await?;
                    println!("Created course {id}");
                }
                Some(("update", args)) => {
                    let (name, description) = draft_of(args);
                    console
                        .hierarchy()
                        .update_course(&course_of(args), &CourseDraft::new(name, description))
                        .await?;
                    println!("Course updated");
                }
                Some(("delete", args)) => {
                    console.hierarchy().delete_course(&course_of(args)).await?;
                    println!("Course and all its levels, lessons, and documents deleted");
                }
                _ => unreachable!("subcommand required"),
            }
        }
        Some(("level", sub)) => {
            let (console, _user) = connect(&config_path).await?;
            match sub.subcommand() {
                Some(("create", args)) => {
                    let (name, description) = draft_of(args);
                    let id = console
                        .hierarchy()
                        .create_level(&course_of(args), &LevelDraft::new(name, description))
                        .await?;
                    println!("Created level {id}");
                }
                Some(("update", args)) => {
                    let (name, description) = draft_of(args);
                    console
                        .hierarchy()
                        .update_level(
                            &course_of(args),
                            &level_of(args),
                            &LevelDraft::new(name, description),
                        )
                        .await?;
                    println!("Level updated");
                }
                Some(("delete", args)) => {
                    console
                        .hierarchy()
                        .delete_level(&course_of(args), &level_of(args))
                        .await?;
                    println!("Level and its lessons deleted");
                }
                _ => unreachable!("subcommand required"),
            }
        }
        Some(("lesson", sub)) => {
            let (console, _user) = connect(&config_path).await?;
            match sub.subcommand() {
                Some(("create", args)) => {
                    let (name, description) = draft_of(args);
                    let number = args.get_one::<String>("number").cloned().unwrap_or_default();
                    let id = console
                        .hierarchy()
                        .create_lesson(
                            &course_of(args),
                            &level_of(args),
                            &LessonDraft::new(name, description, number),
                        )
                        .await?;
                    println!("Created lesson {id}");
                }
                Some(("update", args)) => {
                    let (name, description) = draft_of(args);
                    let number = args.get_one::<String>("number").cloned().unwrap_or_default();
                    console
                        .hierarchy()
                        .update_lesson(
                            &course_of(args),
                            &level_of(args),
                            &lesson_of(args),
                            &LessonDraft::new(name, description, number),
                        )
                        .await?;
                    println!("Lesson updated");
                }
                Some(("delete", args)) => {
                    console
                        .hierarchy()
                        .delete_lesson(&course_of(args), &level_of(args), &lesson_of(args))
                        .await?;
                    println!("Lesson and its documents deleted");
                }
                _ => unreachable!("subcommand required"),
            }
        }
        Some(("document", sub)) => {
            let (console, user) = connect(&config_path).await?;
            match sub.subcommand() {
                Some(("upload", args)) => {
                    let course = course_of(args);
                    let level = level_of(args);
                    let lesson = lesson_of(args);
                    let mut files = Vec::new();
                    for path in args.get_many::<String>("files").unwrap() {
                        let bytes = std::fs::read(path)
                            .with_context(|| format!("reading {path}"))?;
                        let file_name = std::path::Path::new(path)
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or(path)
                            .to_string();
                        let content_type = content_type_for(&file_name).to_string();
                        files.push(FileUpload::new(file_name, content_type, bytes));
                    }
                    let uploaded = console
                        .documents()
                        .upload_documents(&course, &level, &lesson, files)
                        .await?;
                    for doc in uploaded {
                        println!("Uploaded {} [{}]  {} bytes", doc.name, doc.id, doc.size);
                    }
                }
                Some(("delete", args)) => {
                    console
                        .documents()
                        .delete_document(
                            &course_of(args),
                            &level_of(args),
                            &lesson_of(args),
                            &document_of(args),
                        )
                        .await?;
                    println!("Document deleted");
                }
                Some(("view", args)) => {
                    let course = course_of(args);
                    let level = level_of(args);
                    let lesson = lesson_of(args);
                    let document = document_of(args);
                    let tree = console.hierarchy().load_course(&course).await?;
                    let (locator, record) = locate_document(&tree, &level, &lesson, &document)
                        .context("document not found in hierarchy")?;
                    let viewer = Viewer::from(&user);
                    console.access().record_view(&locator, &record, &viewer).await;
                    println!("{}", record.url);
                }
                _ => unreachable!("subcommand required"),
            }
        }
        Some(("access", args)) => {
            let (console, _user) = connect(&config_path).await?;
            let raw = args.get_one::<String>("students").cloned().unwrap_or_default();
            let students: Vec<StudentId> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(StudentId::from)
                .collect();
            let updated = console
                .access()
                .set_access(
                    &course_of(args),
                    &level_of(args),
                    &lesson_of(args),
                    &document_of(args),
                    students,
                )
                .await?;
            if updated.access.is_locked() {
                println!("{}: locked (all students)", updated.name);
            } else {
                println!(
                    "{}: unlocked for {} student(s)",
                    updated.name,
                    updated.access.granted().len()
                );
            }
        }
        Some(("view-log", args)) => {
            let (console, _user) = connect(&config_path).await?;
            let log = console
                .access()
                .get_view_log(
                    &course_of(args),
                    &level_of(args),
                    &lesson_of(args),
                    &document_of(args),
                )
                .await?;
            if log.is_empty() {
                println!("No views recorded yet");
            } else {
                for event in log {
                    println!("{}  {}  {}", event.viewed_at, event.user_name, event.user_email);
                }
            }
        }
        Some(("students", args)) => {
            let (console, _user) = connect(&config_path).await?;
            let mut filter = StudentFilter::any();
            if let Some(search) = args.get_one::<String>("search") {
                filter = filter.with_search(search.clone());
            }
            if let Some(class) = args.get_one::<String>("class") {
                filter = filter.with_class(class.clone());
            }
            let students = console.directory().search_students(&filter).await?;
            println!("{} student(s)", students.len());
            for student in students {
                let id = student.student_id().map(|s| s.to_string()).unwrap_or_default();
                println!("{}  {}  [{}]", student.name, student.email, id);
            }
        }
        Some(("import", _)) => {
            let (console, _user) = connect(&config_path).await?;
            let report = console.import().import_legacy_classes().await?;
            println!("Imported {} course(s)", report.imported_count());
            for name in &report.skipped_existing {
                println!("Skipped (already exists): {name}");
            }
            for name in &report.skipped_no_sessions {
                println!("Skipped (no session count): {name}");
            }
        }
        _ => {}
    }

    Ok(())
}

fn locate_document(
    course: &coursedoc_model::Course,
    level: &LevelId,
    lesson: &LessonId,
    document: &DocumentId,
) -> Option<(DocumentLocator, coursedoc_model::DocumentRecord)> {
    let level_rec = course.levels.iter().find(|l| &l.id == level)?;
    let lesson_rec = level_rec.lessons.iter().find(|l| &l.id == lesson)?;
    let doc = lesson_rec.documents.iter().find(|d| &d.id == document)?;
    Some((
        DocumentLocator::new(course, level_rec, lesson_rec),
        doc.clone(),
    ))
}
