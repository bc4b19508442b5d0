mod cache;

use std::{fs, io::Write, path::Path, sync::Arc};

use portgate::evaluator::{
    EvaluationError, EvaluatorCatalog, RuleEvaluator, RuleInput, ViolationCollection,
};
use zip::{ZipWriter, write::SimpleFileOptions};

struct Allow;

impl RuleEvaluator for Allow {
    fn evaluate(
        &self,
        _input: &RuleInput<'_>,
        _violations: &mut ViolationCollection,
    ) -> Result<bool, EvaluationError> {
        Ok(true)
    }
}

/// Catalog with three concrete evaluators, two abstract bases and one helper.
fn rules_catalog() -> Arc<EvaluatorCatalog> {
    let catalog = EvaluatorCatalog::builder()
        .abstract_unit("acme.rules.RuleBase")
        .abstract_unit("acme.rules.lrn.LrnRuleBase")
        .auxiliary_unit("acme.rules.Formatting")
        .evaluator("acme.rules.lrn.LrnExists", Arc::new(Allow))
        .evaluator("acme.rules.lrn.SpidMatches", Arc::new(Allow))
        .evaluator("acme.rules.npa.NpaNxxOpen", Arc::new(Allow))
        .build()
        .expect("catalog should build");
    Arc::new(catalog)
}

fn write_unit(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("unit directory should be created");
    }
    fs::write(path, b"").expect("unit file should be written");
}

fn write_archive(path: &Path, entries: &[&str]) {
    let file = fs::File::create(path).expect("archive file should be created");
    let mut writer = ZipWriter::new(file);
    for entry in entries {
        if entry.ends_with('/') {
            writer
                .add_directory(*entry, SimpleFileOptions::default())
                .expect("directory entry should be added");
            continue;
        }
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .expect("entry should start");
        writer.write_all(b"").expect("entry should be written");
    }
    writer.finish().expect("archive should finish");
}

fn location(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
