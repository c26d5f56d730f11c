//! Tests for layered configuration loading.

use std::path::PathBuf;

use task_deps::config::{ConfigLoader, ConfigPaths};
use task_deps::graph::ExternalEdgePolicy;
use task_deps::types::DependencyType;
use tempfile::TempDir;

fn write(dir: &std::path::Path, content: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("config.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

mod tier_tests {
    use super::*;

    #[test]
    fn user_tier_overrides_project_field_by_field() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("task-deps");
        let user = temp.path().join("user");
        write(
            &project,
            "server:\n  port: 4000\n  host: 0.0.0.0\ndependencies:\n  max_lag_days: 30\n",
        );
        let user_file = write(&user, "server:\n  port: 5000\ngantt:\n  external_edges: omit\n");

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), Some(user)))
                .unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.dependencies.max_lag_days, 30);
        assert_eq!(config.gantt.external_edges, ExternalEdgePolicy::Omit);
        assert_eq!(loader.config_path(), Some(user_file.as_path()));
    }

    #[test]
    fn explicit_file_replaces_directory_tiers() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("task-deps");
        write(&project, "server:\n  port: 4000\n");
        let explicit = temp.path().join("custom.yaml");
        std::fs::write(
            &explicit,
            "dependencies:\n  default_type: finish_to_finish\n",
        )
        .unwrap();

        let paths = ConfigPaths::with_dirs(Some(project), None).with_explicit_file(&explicit);
        let config = ConfigLoader::load_with_paths(paths).unwrap().into_config();

        assert_eq!(config.server.port, 31995);
        assert_eq!(
            config.dependencies.default_type,
            DependencyType::FinishToFinish
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::default().with_explicit_file(temp.path().join("absent.yaml"));
        assert!(ConfigLoader::load_with_paths(paths).is_err());
    }

    #[test]
    fn malformed_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("task-deps");
        write(&project, "server: [not, a, map\n");

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), None)).unwrap();
        assert_eq!(loader.config().server.port, 31995);
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn loaded_config_is_validated_separately() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("task-deps");
        write(&project, "server:\n  request_timeout_ms: 0\n");

        let config = ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), None))
            .unwrap()
            .into_config();
        assert!(config.validate().is_err());
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let temp = TempDir::new().unwrap();
        let mut config = task_deps::config::Config::default();
        config.server.db_path = temp.path().join("nested/dir/tasks.db");

        config.ensure_db_dir().unwrap();
        assert!(temp.path().join("nested/dir").is_dir());
    }
}
