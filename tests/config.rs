// ABOUTME: Integration tests for settings parsing and discovery.
// ABOUTME: Tests YAML parsing, defaults, drive descriptors and file lookup.

use datalab_launcher::config::*;
use datalab_launcher::error::Error;
use datalab_launcher::runtime::RuntimeType;
use std::path::PathBuf;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_full_settings() {
        let yaml = r#"
local_drive: /srv/datalab
latest_dockerfile: /mnt/share/datalab/
local_dockerfile: /srv/datalab/dockerfile/
containers_log: /srv/datalab/containers.json
docker_client_timeout: 2m
stop_timeout: 30s
local_port: 9090
opening_countdown: 0
runtime: podman
socket: /run/user/1000/podman/podman.sock
log_file: /tmp/launcher.log
drives:
  - path: /mnt/data
    mountpoint: /content/datalab/data
    access: ro
  - Path: /mnt/scratch
    Mountpoint: /content/datalab/scratch
    Access: rw
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.local_drive, PathBuf::from("/srv/datalab"));
        assert_eq!(settings.docker_client_timeout, Duration::from_secs(120));
        assert_eq!(settings.stop_timeout, Duration::from_secs(30));
        assert_eq!(settings.local_port, 9090);
        assert_eq!(settings.opening_countdown, 0);
        assert_eq!(settings.runtime, Some(RuntimeType::Podman));
        assert_eq!(settings.drives.len(), 2);
        assert_eq!(settings.drives[0].access, Access::Ro);
        assert_eq!(settings.drives[1].access, Access::Rw);
        assert_eq!(
            settings.local_recipe(),
            PathBuf::from("/srv/datalab/dockerfile/Dockerfile")
        );

        let runtime = settings.runtime_config();
        assert_eq!(runtime.runtime, Some(RuntimeType::Podman));
    }

    #[test]
    fn missing_local_drive_is_an_error() {
        assert!(matches!(
            Settings::from_yaml("latest_dockerfile: /x\n"),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn drive_access_defaults_to_read_only() {
        let yaml = "local_drive: /a\nlatest_dockerfile: /b\ndrives:\n  - path: /c\n    mountpoint: /content/c\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.drives[0].access, Access::Ro);
    }

    #[test]
    fn zero_port_is_invalid() {
        let yaml = "local_drive: /a\nlatest_dockerfile: /b\nlocal_port: 0\n";
        assert!(matches!(
            Settings::from_yaml(yaml),
            Err(Error::InvalidConfig(_))
        ));
    }
}

mod discovery {
    use super::*;

    const MINIMAL: &str = "local_drive: /a\nlatest_dockerfile: /b\n";

    #[test]
    fn finds_launcher_yml_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();
        let settings = Settings::discover(None, dir.path()).unwrap();
        assert_eq!(settings.local_drive, PathBuf::from("/a"));
    }

    #[test]
    fn finds_dot_datalab_variant() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".datalab")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME_DIR), MINIMAL).unwrap();
        assert!(Settings::discover(None, dir.path()).is_ok());
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();
        let other = dir.path().join("other.yml");
        std::fs::write(&other, "local_drive: /other\nlatest_dockerfile: /b\n").unwrap();

        let settings = Settings::discover(Some(&other), dir.path()).unwrap();
        assert_eq!(settings.local_drive, PathBuf::from("/other"));
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::discover(Some(&dir.path().join("nope.yml")), dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn init_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), None, false).unwrap();
        assert!(matches!(
            init_config(dir.path(), None, false),
            Err(Error::AlreadyExists(_))
        ));
        assert!(init_config(dir.path(), Some("/data"), true).is_ok());
    }
}
