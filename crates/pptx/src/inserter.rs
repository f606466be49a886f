//! File-level name operations on .pptx files.

use crate::output::{persist, temp_file_beside};
use crate::presentation::PptxDocument;
use pptx_name_core::{
    EditOutcome, EditReport, Error, NameEditor, Result, TextBoxLayout, TextStyle,
};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Where [`NameInserter::insert_if_absent`] writes its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// Overwrite the source file.
    InPlace,
    /// `<source without extension>_updated.pptx` beside the source.
    UpdatedCopy,
    /// An explicit output path.
    Path(PathBuf),
}

impl SaveTarget {
    /// The command-line `save_as_new` switch: a new file when true.
    pub fn from_save_as_new(save_as_new: bool) -> Self {
        if save_as_new {
            SaveTarget::UpdatedCopy
        } else {
            SaveTarget::InPlace
        }
    }

    pub fn resolve(&self, source: &Path) -> PathBuf {
        match self {
            SaveTarget::InPlace => source.to_path_buf(),
            SaveTarget::UpdatedCopy => updated_path(source),
            SaveTarget::Path(path) => path.clone(),
        }
    }
}

/// `deck.pptx` becomes `deck_updated.pptx` in the same directory.
pub fn updated_path(source: &Path) -> PathBuf {
    let mut name = source.with_extension("").into_os_string();
    name.push("_updated.pptx");
    PathBuf::from(name)
}

/// Puts a customer name into presentation files.
#[derive(Debug, Clone, Default)]
pub struct NameInserter {
    editor: NameEditor,
}

impl NameInserter {
    /// Create an inserter with 24pt white text and the `{{NAME}}` placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.editor = self.editor.with_style(style);
        self
    }

    pub fn with_layout(mut self, layout: TextBoxLayout) -> Self {
        self.editor = self.editor.with_layout(layout);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.editor = self.editor.with_placeholder(placeholder);
        self
    }

    /// Add `name` to the first slide of `source` unless a shape there
    /// already reads exactly `name`, then save to `target`.
    ///
    /// The output is written even when nothing changed.
    pub fn insert_if_absent(
        &self,
        source: &Path,
        target: &SaveTarget,
        name: &str,
    ) -> Result<EditReport> {
        let mut doc = PptxDocument::open(source)?;
        let outcome = self.editor.insert_if_absent(&mut doc, name)?;

        let output = target.resolve(source);
        doc.save(&output)?;
        log::info!("Saved {}", output.display());

        Ok(report(source, output, name, outcome))
    }

    /// Copy `template` byte for byte, add `name` to the copy's first slide
    /// unless present, and move the copy to `output`. The template is never
    /// opened for writing, and `output` may not be the template itself.
    pub fn insert_from_template(
        &self,
        template: &Path,
        output: &Path,
        name: &str,
    ) -> Result<EditReport> {
        if !template.exists() {
            return Err(Error::TemplateNotFound(template.to_path_buf()));
        }
        if same_file(template, output) {
            return Err(Error::InvalidArgument(format!(
                "output {} is the template itself",
                output.display()
            )));
        }

        let mut copy = temp_file_beside(output)?;
        std::io::copy(&mut std::fs::File::open(template)?, copy.as_file_mut())?;
        log::debug!("Copied {} to {}", template.display(), copy.path().display());

        let mut doc = PptxDocument::open(copy.path())?;
        let outcome = self.editor.insert_if_absent(&mut doc, name)?;

        if doc.is_modified() {
            let bytes = doc.to_bytes()?;
            let file = copy.as_file_mut();
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&bytes)?;
        }
        persist(copy, output, Some(template))?;
        log::info!("Saved {}", output.display());

        Ok(report(template, output.to_path_buf(), name, outcome))
    }

    /// Replace the placeholder with `name` in every text frame on every
    /// slide of `source` and write the result to `output`.
    ///
    /// There is no "already present" check; a deck without the placeholder
    /// is written out unchanged.
    pub fn substitute_placeholder(
        &self,
        source: &Path,
        output: &Path,
        name: &str,
    ) -> Result<EditReport> {
        let mut doc = PptxDocument::open(source)?;
        let outcome = self.editor.substitute_placeholder(&mut doc, name)?;

        if let EditOutcome::Substituted { occurrences: 0, .. } = outcome {
            log::warn!(
                "No {} placeholder found in {}",
                self.editor.placeholder(),
                source.display()
            );
        }

        doc.save(output)?;
        log::info!("Saved {}", output.display());

        Ok(report(source, output.to_path_buf(), name, outcome))
    }
}

/// Whether both paths name one existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn report(source: &Path, output: PathBuf, name: &str, outcome: EditOutcome) -> EditReport {
    EditReport {
        source: source.to_path_buf(),
        output,
        name: name.to_string(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updated_path() {
        assert_eq!(
            updated_path(Path::new("uploads/input.pptx")),
            PathBuf::from("uploads/input_updated.pptx")
        );
        assert_eq!(
            updated_path(Path::new("deck")),
            PathBuf::from("deck_updated.pptx")
        );
        assert_eq!(
            updated_path(Path::new("my.deck.pptx")),
            PathBuf::from("my.deck_updated.pptx")
        );
    }

    #[test]
    fn test_save_target_resolve() {
        let source = Path::new("a/b.pptx");
        assert_eq!(SaveTarget::from_save_as_new(false).resolve(source), source);
        assert_eq!(
            SaveTarget::from_save_as_new(true).resolve(source),
            PathBuf::from("a/b_updated.pptx")
        );
        assert_eq!(
            SaveTarget::Path(PathBuf::from("c.pptx")).resolve(source),
            PathBuf::from("c.pptx")
        );
    }

    #[test]
    fn test_missing_template_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pptx");

        let err = NameInserter::new()
            .insert_from_template(&dir.path().join("nope.pptx"), &output, "Ann")
            .unwrap_err();

        assert!(matches!(err, Error::TemplateNotFound(_)));
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("t.pptx");
        std::fs::write(&file, b"x").unwrap();

        assert!(same_file(&file, &dir.path().join(".").join("t.pptx")));
        assert!(!same_file(&file, &dir.path().join("other.pptx")));
    }
}
