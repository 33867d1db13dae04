// ABOUTME: Translates host paths into the runtime's path syntax.
// ABOUTME: Builds the bind-mount set for a new container.

use crate::config::{Access, DriveDescriptor};
use crate::runtime::VolumeMount;
use crate::types::HostOs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where the container's private content directory is mounted.
pub const CONTENT_MOUNT: &str = "/content/datalab/";
/// Where the shared notebooks directory is mounted.
pub const NOTEBOOKS_MOUNT: &str = "/content/datalab/workspace/my_notebooks";

/// Container side of a bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindTarget {
    pub container_path: String,
    pub access: Access,
}

/// Translated host path to container target. One entry per host path.
pub type BindSet = BTreeMap<String, BindTarget>;

/// Private content directory of a container.
pub fn content_dir(local_drive: &Path, name: &str) -> PathBuf {
    local_drive.join("containers").join(name)
}

/// Notebooks directory shared by every container.
pub fn notebooks_dir(local_drive: &Path) -> PathBuf {
    local_drive.join("my_notebooks")
}

/// Translate a host path for the runtime.
///
/// Linux paths are made absolute. Windows drive prefixes become `/X` and
/// backslashes become slashes. Both are normalized lexically: `.` segments
/// and trailing separators are dropped and `..` is resolved. Other hosts pass
/// paths through.
pub fn translate(host_path: &Path, os: HostOs) -> String {
    match os {
        HostOs::Linux => translate_linux(host_path),
        HostOs::Windows => translate_windows(&host_path.to_string_lossy()),
        HostOs::Other => host_path.to_string_lossy().into_owned(),
    }
}

fn translate_linux(host_path: &Path) -> String {
    let absolute = std::path::absolute(host_path)
        .unwrap_or_else(|_| host_path.to_path_buf())
        .to_string_lossy()
        .into_owned();
    let rooted = absolute.starts_with('/');
    let joined = normalize_segments(absolute.split('/'), rooted).join("/");
    if rooted { format!("/{joined}") } else { joined }
}

fn translate_windows(raw: &str) -> String {
    let (drive, rest) = match raw.as_bytes() {
        [letter, b':', ..] if letter.is_ascii_alphabetic() => (Some(&raw[..1]), &raw[2..]),
        _ => (None, raw),
    };
    let leading = rest.chars().take_while(|c| matches!(c, '\\' | '/')).count();
    let joined = normalize_segments(rest.split(['\\', '/']), drive.is_some() || leading > 0)
        .join("/");
    match drive {
        Some(letter) => format!("/{letter}/{joined}"),
        // UNC paths keep their double separator.
        None => format!("{}{joined}", "/".repeat(leading.min(2))),
    }
}

/// Drop empty and `.` segments and resolve `..`. A rooted path cannot climb
/// above its root.
fn normalize_segments<'a>(segments: impl Iterator<Item = &'a str>, rooted: bool) -> Vec<&'a str> {
    let mut kept: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                if kept.last().is_some_and(|last| *last != "..") {
                    kept.pop();
                } else if !rooted {
                    kept.push("..");
                }
            }
            other => kept.push(other),
        }
    }
    kept
}

/// Compute every bind a new container gets.
///
/// Drives are applied after the built-in binds, so a drive that resolves to
/// the same host path replaces them.
pub fn build_bind_set(
    content_dir: &Path,
    notebooks_dir: &Path,
    drives: &[DriveDescriptor],
    os: HostOs,
) -> BindSet {
    let mut binds = BindSet::new();
    binds.insert(
        translate(content_dir, os),
        BindTarget {
            container_path: CONTENT_MOUNT.to_string(),
            access: Access::Rw,
        },
    );
    binds.insert(
        translate(notebooks_dir, os),
        BindTarget {
            container_path: NOTEBOOKS_MOUNT.to_string(),
            access: Access::Rw,
        },
    );
    for drive in drives {
        binds.insert(
            translate(&drive.path, os),
            BindTarget {
                container_path: drive.mountpoint.clone(),
                access: drive.access,
            },
        );
    }
    binds
}

/// Bind set in the runtime's mount form.
pub fn to_mounts(binds: &BindSet) -> Vec<VolumeMount> {
    binds
        .iter()
        .map(|(source, target)| VolumeMount {
            source: source.clone(),
            target: target.container_path.clone(),
            read_only: target.access.is_read_only(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_drive_letter_is_rewritten() {
        assert_eq!(
            translate(Path::new(r"C:\Users\x"), HostOs::Windows),
            "/C/Users/x"
        );
        assert_eq!(translate(Path::new(r"d:\data"), HostOs::Windows), "/d/data");
    }

    #[test]
    fn windows_path_without_drive_only_swaps_separators() {
        assert_eq!(
            translate(Path::new(r"\\server\share"), HostOs::Windows),
            "//server/share"
        );
    }

    #[test]
    fn linux_absolute_path_is_unchanged() {
        assert_eq!(translate(Path::new("/home/x"), HostOs::Linux), "/home/x");
    }

    #[test]
    fn linux_paths_are_normalized() {
        assert_eq!(translate(Path::new("/mnt/s/"), HostOs::Linux), "/mnt/s");
        assert_eq!(
            translate(Path::new("/d/x/../my_notebooks"), HostOs::Linux),
            "/d/my_notebooks"
        );
        assert_eq!(translate(Path::new("/d/./a//b"), HostOs::Linux), "/d/a/b");
        assert_eq!(translate(Path::new("/../a"), HostOs::Linux), "/a");
    }

    #[test]
    fn windows_paths_are_normalized_before_rewrite() {
        assert_eq!(
            translate(Path::new(r"C:\Users\x\"), HostOs::Windows),
            "/C/Users/x"
        );
        assert_eq!(
            translate(Path::new(r"C:\dl\tmp\..\my_notebooks"), HostOs::Windows),
            "/C/dl/my_notebooks"
        );
    }

    #[test]
    fn linux_relative_path_becomes_absolute() {
        let translated = translate(Path::new("rel/dir"), HostOs::Linux);
        assert!(Path::new(&translated).is_absolute());
        assert!(translated.ends_with("rel/dir"));
    }

    #[test]
    fn other_hosts_pass_through() {
        assert_eq!(translate(Path::new("rel/x"), HostOs::Other), "rel/x");
    }

    #[test]
    fn bind_set_has_content_and_notebooks() {
        let binds = build_bind_set(
            Path::new("/d/containers/a"),
            Path::new("/d/my_notebooks"),
            &[],
            HostOs::Linux,
        );
        assert_eq!(binds.len(), 2);
        assert_eq!(binds["/d/containers/a"].container_path, CONTENT_MOUNT);
        assert_eq!(binds["/d/my_notebooks"].container_path, NOTEBOOKS_MOUNT);
    }

    #[test]
    fn duplicate_drive_path_last_wins() {
        let drives = vec![
            DriveDescriptor {
                path: PathBuf::from("/mnt/s"),
                mountpoint: "/content/first".to_string(),
                access: Access::Ro,
            },
            DriveDescriptor {
                path: PathBuf::from("/mnt/s"),
                mountpoint: "/content/second".to_string(),
                access: Access::Rw,
            },
        ];
        let binds = build_bind_set(
            Path::new("/d/containers/a"),
            Path::new("/d/my_notebooks"),
            &drives,
            HostOs::Linux,
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(binds["/mnt/s"].container_path, "/content/second");
        assert_eq!(binds["/mnt/s"].access, Access::Rw);
    }

    #[test]
    fn trailing_slash_drive_is_the_same_bind() {
        let drives = vec![
            DriveDescriptor {
                path: PathBuf::from("/mnt/s/"),
                mountpoint: "/content/first".to_string(),
                access: Access::Ro,
            },
            DriveDescriptor {
                path: PathBuf::from("/mnt/s"),
                mountpoint: "/content/second".to_string(),
                access: Access::Rw,
            },
        ];
        let binds = build_bind_set(
            Path::new("/d/containers/a"),
            Path::new("/d/my_notebooks"),
            &drives,
            HostOs::Linux,
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(binds["/mnt/s"].container_path, "/content/second");
    }

    #[test]
    fn drive_resolving_to_notebooks_replaces_builtin_bind() {
        let drives = vec![DriveDescriptor {
            path: PathBuf::from("/d/x/../my_notebooks"),
            mountpoint: "/content/notes".to_string(),
            access: Access::Ro,
        }];
        let binds = build_bind_set(
            Path::new("/d/containers/a"),
            Path::new("/d/my_notebooks"),
            &drives,
            HostOs::Linux,
        );
        assert_eq!(binds.len(), 2);
        assert_eq!(binds["/d/my_notebooks"].container_path, "/content/notes");
        assert_eq!(binds["/d/my_notebooks"].access, Access::Ro);
    }

    #[test]
    fn mounts_carry_read_only_flag() {
        let drives = vec![DriveDescriptor {
            path: PathBuf::from("/mnt/ro"),
            mountpoint: "/content/ro".to_string(),
            access: Access::Ro,
        }];
        let mounts = to_mounts(&build_bind_set(
            Path::new("/d/c"),
            Path::new("/d/n"),
            &drives,
            HostOs::Linux,
        ));
        let ro = mounts.iter().find(|m| m.source == "/mnt/ro").unwrap();
        assert!(ro.read_only);
        assert!(mounts.iter().filter(|m| m.source != "/mnt/ro").all(|m| !m.read_only));
    }
}
