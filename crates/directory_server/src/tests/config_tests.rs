use super::{read_seed, resolve_settings, Settings};

use std::{
    collections::HashMap,
    env, fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use shared::domain::Department;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_without_file_or_env() {
    assert_eq!(resolve_settings(None, env_from(&[])), Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let settings = resolve_settings(
        Some("bind_addr = \"0.0.0.0:9000\"\nseed_path = \"./seed.json\"\n"),
        env_from(&[]),
    );
    assert_eq!(settings.bind_addr, "0.0.0.0:9000");
    assert_eq!(settings.seed_path, Some(PathBuf::from("./seed.json")));
}

#[test]
fn app_prefixed_env_wins_over_plain_env_and_file() {
    let settings = resolve_settings(
        Some("bind_addr = \"0.0.0.0:9000\"\n"),
        env_from(&[
            ("DIRECTORY_BIND", "127.0.0.1:9001"),
            ("APP__BIND_ADDR", "127.0.0.1:9002"),
        ]),
    );
    assert_eq!(settings.bind_addr, "127.0.0.1:9002");
}

#[test]
fn malformed_file_is_ignored() {
    let settings = resolve_settings(Some("bind_addr = [1, 2"), env_from(&[]));
    assert_eq!(settings, Settings::default());
}

#[test]
fn empty_seed_path_means_no_seed() {
    let settings = resolve_settings(None, env_from(&[("DIRECTORY_SEED", "")]));
    assert_eq!(settings.seed_path, None);
}

#[test]
fn reads_seed_file_of_drafts() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("employee_directory_seed_{suffix}.json"));
    fs::write(
        &path,
        r#"[{"name":"Ada","email":"ada@example.com","department":"Engineering","role":"Engineer"}]"#,
    )
    .expect("write seed");

    let drafts = read_seed(&path).expect("seed");
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].department, Department::Engineering);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn missing_seed_file_names_the_path() {
    let err = read_seed(std::path::Path::new("/nonexistent/seed.json")).expect_err("missing");
    assert!(err.to_string().contains("/nonexistent/seed.json"));
}
