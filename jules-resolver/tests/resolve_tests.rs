//! Template resolution through the public `CommandResolver` seam.

use std::path::PathBuf;

use jules_core::{Config, ProjectConfig, ProjectName, StageConfig, StageName};
use jules_resolver::{CommandResolver, ResolveError, TemplateResolver};
use rstest::rstest;

fn config_with(template: &str) -> Config {
    let mut cfg = Config {
        root: PathBuf::from("/monorepo"),
        ..Config::default()
    };
    cfg.vars.insert("registry".into(), "ghcr.io/acme".into());
    cfg.stages
        .insert(StageName::from("deploy"), StageConfig::new(template));
    let mut payments = ProjectConfig::default();
    payments.vars.insert("replicas".into(), "3".into());
    cfg.projects.insert(ProjectName::from("payments"), payments);
    cfg
}

#[rstest]
#[case::plain("make deploy", "make deploy")]
#[case::filters("echo {{ project | upper }}", "echo PAYMENTS")]
#[case::global_var("docker push {{ vars.registry }}/{{ project }}", "docker push ghcr.io/acme/payments")]
#[case::project_var("kubectl scale --replicas={{ vars.replicas }}", "kubectl scale --replicas=3")]
#[case::stage_name("make {{ stage }}", "make deploy")]
#[case::no_html_escape("echo '{{ vars.registry }}' > out.txt", "echo 'ghcr.io/acme' > out.txt")]
fn renders_template(#[case] template: &str, #[case] expected: &str) {
    let cfg = config_with(template);
    let spec = TemplateResolver::new()
        .resolve(&StageName::from("deploy"), &ProjectName::from("payments"), &cfg)
        .expect("resolve");
    assert_eq!(spec.command_line, expected);
}

#[test]
fn vars_are_not_top_level() {
    let cfg = config_with("docker push {{ registry }}");
    let err = TemplateResolver::new()
        .resolve(&StageName::from("deploy"), &ProjectName::from("payments"), &cfg)
        .unwrap_err();
    assert!(matches!(err, ResolveError::Template { .. }), "got: {err}");
    assert!(err.to_string().contains("payments"));
}

#[test]
fn trait_object_resolution() {
    let cfg = config_with("./deploy.sh");
    let resolver: &dyn CommandResolver = &TemplateResolver::new();
    let spec = resolver
        .resolve(&StageName::from("deploy"), &ProjectName::from("payments"), &cfg)
        .expect("resolve");
    assert_eq!(spec.project, ProjectName::from("payments"));
    assert_eq!(spec.stage, StageName::from("deploy"));
    assert_eq!(spec.working_dir, PathBuf::from("/monorepo/payments"));
}
