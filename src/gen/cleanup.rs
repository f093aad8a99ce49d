use super::{diags, Settings, GENERATED_EXTENSION};
use crate::{diag::Sink, PathBuf};

/// Removes previously generated source files from the output directory of
/// each enabled kind of artifact
///
/// Only files with the generated extension directly inside each directory are
/// removed, nothing else is touched. Failures are reported to the sink and
/// don't stop the cleanup.
pub fn remove_old_output(settings: &Settings, sink: &mut Sink) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for kind in settings.enabled_kinds() {
        let dir = settings.output_dir(kind);
        if !dir.is_dir() {
            log::debug!("{kind} output directory {dir} does not exist, nothing to clean");
            continue;
        }

        for entry in walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    sink.push(diags::CleanupFailed {
                        path: err
                            .path()
                            .map_or_else(|| dir.to_string(), |p| p.display().to_string()),
                        error: &err,
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file()
                || entry.path().extension() != Some(std::ffi::OsStr::new(GENERATED_EXTENSION))
            {
                continue;
            }

            let Ok(path) = PathBuf::from_path_buf(entry.into_path()) else {
                continue;
            };

            match fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("removed {path}");
                    removed.push(path);
                }
                Err(err) => sink.push(diags::CleanupFailed {
                    path: path.to_string(),
                    error: &err,
                }),
            }
        }
    }

    removed
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gen::ArtifactKind;

    #[test]
    fn only_removes_generated_files_of_enabled_kinds() {
        let td = tempfile::tempdir().unwrap();
        let root = PathBuf::from_path_buf(td.path().to_owned()).unwrap();

        let mut settings = super::super::Settings::new(root.clone(), "com.example");
        settings.generate_mappers = false;

        let types = settings.output_dir(ArtifactKind::Entity);
        let mappers = settings.output_dir(ArtifactKind::Mapper);
        assert_eq!(types, root.join("com/example/types"));

        std::fs::create_dir_all(types.join("nested")).unwrap();
        std::fs::create_dir_all(&mappers).unwrap();

        for path in [
            types.join("Person.rs"),
            types.join("Employee.rs"),
            types.join("notes.txt"),
            types.join("nested/Deep.rs"),
            mappers.join("PersonMapper.rs"),
            root.join("com/example/Stray.rs"),
        ] {
            std::fs::write(path, "").unwrap();
        }

        let mut sink = Sink::new();
        let removed = remove_old_output(&settings, &mut sink);

        assert!(sink.is_empty());
        assert_eq!(
            removed,
            [types.join("Employee.rs"), types.join("Person.rs")]
        );

        assert!(types.join("notes.txt").exists());
        assert!(types.join("nested/Deep.rs").exists());
        assert!(mappers.join("PersonMapper.rs").exists());
        assert!(root.join("com/example/Stray.rs").exists());
    }

    #[test]
    fn missing_directories_are_ignored() {
        let td = tempfile::tempdir().unwrap();
        let root = PathBuf::from_path_buf(td.path().join("out")).unwrap();

        let settings = super::super::Settings::new(root, "com.example");

        let mut sink = Sink::new();
        assert!(remove_old_output(&settings, &mut sink).is_empty());
        assert!(sink.is_empty());
    }
}
