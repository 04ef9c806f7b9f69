use super::*;
use crate::config::CONFIG_FILE_NAME;
use crate::platform::Platform;
use crate::secret::Pin;
use crate::stage::{Stage, StageError, StageInvocation};
use std::collections::VecDeque;

const CONFIG: &str = r#"{
    "TIN": "12345678", "Name": "Acme", "VAT": "30/31-00001-5",
    "Environment": "TEST", "BusinUnitCode": "bu1", "TCRCode": "tcr1",
    "SoftCode": "soft1", "OperatorCode": "op1",
    "Typless": { "APIKey": "key", "Template": "tpl" }
}"#;

#[derive(Default)]
struct ScriptedOperator {
    entry: Option<EntryPoint>,
    paths: VecDeque<PathBuf>,
    pin_reads: usize,
    prompts: Vec<String>,
}

impl Operator for ScriptedOperator {
    fn choose_entry(&mut self) -> Result<Option<EntryPoint>> {
        Ok(self.entry)
    }

    fn read_pin(&mut self) -> Result<Pin> {
        self.pin_reads += 1;
        Ok(Pin::new("1234"))
    }

    fn read_path(&mut self, prompt: &str) -> Result<PathBuf> {
        self.prompts.push(prompt.to_string());
        self.paths
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted path left"))
    }
}

#[derive(Default)]
struct CountingRunner {
    stages: Vec<Stage>,
}

impl StageRunner for CountingRunner {
    fn run(&mut self, invocation: &StageInvocation) -> Result<(), StageError> {
        self.stages.push(invocation.stage);
        let body = match invocation.stage {
            Stage::Dsig => r#"<Invoice IIC="ABC123"/>"#,
            Stage::Reg => "<FIC>XYZ</FIC>",
            _ => "artifact",
        };
        if let Some(out) = &invocation.output {
            std::fs::write(out, body).expect("write artifact");
        }
        Ok(())
    }
}

fn work_dir_with_config(config: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), config).expect("write config");
    dir
}

#[test]
fn unrecognized_menu_choice_does_nothing() {
    let dir = work_dir_with_config(CONFIG);
    let executables = ExecutableSet::resolve(dir.path(), Platform::Unix);
    let mut operator = ScriptedOperator::default();
    let mut runner = CountingRunner::default();
    let outcome = run_session(
        &SessionOptions::default(),
        dir.path(),
        &executables,
        &mut operator,
        &mut runner,
    )
    .expect("session");
    assert!(matches!(outcome, SessionOutcome::Cancelled));
    assert_eq!(operator.pin_reads, 0);
    assert!(runner.stages.is_empty());
}

#[test]
fn automatic_session_prompts_for_invoice_and_runs_all_stages() {
    let dir = work_dir_with_config(CONFIG);
    std::fs::write(dir.path().join("inv.pdf"), "pdf").expect("write invoice");
    let executables = ExecutableSet::resolve(dir.path(), Platform::Unix);
    let mut operator = ScriptedOperator {
        entry: Some(EntryPoint::Automatic),
        paths: VecDeque::from([PathBuf::from("inv.pdf")]),
        ..ScriptedOperator::default()
    };
    let mut runner = CountingRunner::default();
    let outcome = run_session(
        &SessionOptions::default(),
        dir.path(),
        &executables,
        &mut operator,
        &mut runner,
    )
    .expect("session");

    assert_eq!(operator.pin_reads, 1);
    assert_eq!(operator.prompts, ["Please provide invoice file path"]);
    assert_eq!(runner.stages, Stage::ALL.to_vec());
    match outcome {
        SessionOutcome::Completed(report) => assert_eq!(
            report.outcome,
            PipelineOutcome::Certified {
                pdf: dir.path().join("inv.reg.pdf")
            }
        ),
        SessionOutcome::Cancelled => panic!("session was cancelled"),
    }
}

#[test]
fn command_line_answers_skip_prompts() {
    let dir = work_dir_with_config(CONFIG);
    let bridge = dir.path().join("inv.bridge");
    std::fs::write(&bridge, "bridge").expect("write bridge");
    let executables = ExecutableSet::resolve(dir.path(), Platform::Unix);
    let options = SessionOptions {
        entry: Some(EntryPoint::Manual),
        input: Some(bridge),
    };
    let mut operator = ScriptedOperator::default();
    let mut runner = CountingRunner::default();
    let outcome =
        run_session(&options, dir.path(), &executables, &mut operator, &mut runner).expect("run");

    assert!(operator.prompts.is_empty());
    assert_eq!(operator.pin_reads, 1);
    assert_eq!(
        runner.stages,
        [Stage::Iic, Stage::Dsig, Stage::Reg, Stage::Keep, Stage::Qrc]
    );
    let SessionOutcome::Completed(report) = outcome else {
        panic!("session was cancelled");
    };
    let rendered = render_outcome(&report.outcome);
    assert!(rendered.contains("IKOF (Kôd izdavaoca računa): ABC123\n"));
    assert!(rendered.contains("JIKR (Jedinstveni identifikacioni kod računa): XYZ\n"));
}

#[test]
fn invalid_config_stops_before_pin_and_stages() {
    let dir = work_dir_with_config(r#"{"TIN": "1", "Name": "n"}"#);
    let executables = ExecutableSet::resolve(dir.path(), Platform::Unix);
    let mut operator = ScriptedOperator {
        entry: Some(EntryPoint::Automatic),
        ..ScriptedOperator::default()
    };
    let mut runner = CountingRunner::default();
    let err = run_session(
        &SessionOptions::default(),
        dir.path(),
        &executables,
        &mut operator,
        &mut runner,
    )
    .expect_err("config is incomplete");
    assert!(err.to_string().contains("VAT"));
    assert_eq!(operator.pin_reads, 0);
    assert!(runner.stages.is_empty());
}

#[test]
fn directory_input_is_rejected() {
    let dir = work_dir_with_config(CONFIG);
    std::fs::create_dir(dir.path().join("inbox")).expect("create dir");
    let err = validate_input_file(dir.path(), Path::new("inbox")).expect_err("is a directory");
    assert!(matches!(err, InputError::NotAFile { .. }));

    let err = validate_input_file(dir.path(), Path::new("missing.pdf")).expect_err("missing");
    assert!(matches!(err, InputError::NotFound { .. }));
}

#[test]
fn relative_input_resolves_against_work_dir() {
    let dir = work_dir_with_config(CONFIG);
    std::fs::write(dir.path().join("inv.pdf"), "pdf").expect("write invoice");
    let resolved = validate_input_file(dir.path(), Path::new("inv.pdf")).expect("valid");
    assert_eq!(resolved, dir.path().join("inv.pdf"));
}

#[test]
fn explicit_work_dir_is_canonicalized() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let nested = dir.path().join("a");
    std::fs::create_dir(&nested).expect("create nested");
    let resolved = resolve_work_dir(Some(nested.join("..").as_path())).expect("resolve");
    assert_eq!(resolved, dir.path().canonicalize().expect("canonicalize"));
}

#[test]
fn certified_outcome_names_the_pdf() {
    let text = render_outcome(&PipelineOutcome::Certified {
        pdf: PathBuf::from("/w/inv.reg.pdf"),
    });
    assert!(text.starts_with("Invoice registered. New PDF file: /w/inv.reg.pdf\n"));
}
