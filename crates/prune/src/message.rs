//! Commit message and metadata composition
//!
//! Removal targets are expected in the shape
//! `.../<prefix>_<owner>/<prefix>_<name>.<ext>`; each one is rendered as
//! `<owner>.<name>` and the labels are substituted into a template.

use crate::error::PruneError;
use crate::Result;
use snip_core::{Blake3Hash, Commit, Signature};

/// Token replaced by the joined feature labels
pub const FEATURES_PLACEHOLDER: &str = "$features";

pub const DEFAULT_TEMPLATE: &str = "Pruning Redundant Features: $features";

pub const DEFAULT_AUTHOR_NAME: &str = "Ballet";
pub const DEFAULT_AUTHOR_EMAIL: &str = "dai-lab@mit.edu";

/// Identity every pruning commit is attributed to unless configured otherwise
pub fn default_author() -> Signature {
    Signature::new(DEFAULT_AUTHOR_NAME, DEFAULT_AUTHOR_EMAIL)
}

/// Commit message formatting options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessageOptions {
    /// Template containing [`FEATURES_PLACEHOLDER`] exactly once
    pub template: String,
}

impl Default for CommitMessageOptions {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl CommitMessageOptions {
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_template(&self.template)
    }
}

/// Check that `template` carries the placeholder exactly once
pub fn validate_template(template: &str) -> Result<()> {
    match template.matches(FEATURES_PLACEHOLDER).count() {
        1 => Ok(()),
        0 => Err(PruneError::InvalidTemplate(format!(
            "{:?} does not contain {}",
            template, FEATURES_PLACEHOLDER
        ))),
        n => Err(PruneError::InvalidTemplate(format!(
            "{:?} contains {} {} times",
            template, FEATURES_PLACEHOLDER, n
        ))),
    }
}

/// Short label for a removal target
///
/// `features/contrib/user_kelvin/feature_adder.py` becomes `kelvin.adder`.
pub fn feature_label(path: &str) -> Result<String> {
    let mut segments = path.rsplit('/');
    let (Some(file), Some(dir)) = (segments.next(), segments.next()) else {
        return Err(PruneError::malformed(path, "expected <dir>/<file>"));
    };

    let owner = second_token(dir)
        .ok_or_else(|| PruneError::malformed(path, format!("directory {:?} has no owner token", dir)))?;

    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    let name = second_token(stem)
        .ok_or_else(|| PruneError::malformed(path, format!("file {:?} has no name token", file)))?;

    Ok(format!("{}.{}", owner, name))
}

fn second_token(segment: &str) -> Option<&str> {
    segment.split('_').nth(1).filter(|token| !token.is_empty())
}

/// Render the commit message for `paths`
pub fn compose_message<P: AsRef<str>>(paths: &[P], options: &CommitMessageOptions) -> Result<String> {
    options.validate()?;
    let labels = paths
        .iter()
        .map(|p| feature_label(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(options
        .template
        .replacen(FEATURES_PLACEHOLDER, &labels.join(", "), 1))
}

/// Everything the publisher needs for a pruning commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDraft {
    pub parent: Blake3Hash,
    pub tree: Blake3Hash,
    pub message: String,
    pub author: Signature,
}

impl CommitDraft {
    pub fn compose<P: AsRef<str>>(
        parent: Blake3Hash,
        tree: Blake3Hash,
        removed: &[P],
        options: &CommitMessageOptions,
        author: Signature,
    ) -> Result<Self> {
        Ok(Self {
            parent,
            tree,
            message: compose_message(removed, options)?,
            author,
        })
    }

    pub fn into_commit(self, ts_unix_ms: u64) -> Commit {
        Commit {
            parent: Some(self.parent),
            tree: self.tree,
            message: self.message,
            author: self.author,
            ts_unix_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_core::hash_bytes;

    #[test]
    fn test_feature_label() {
        assert_eq!(
            feature_label("features/contrib/user_kelvin/feature_adder.py").unwrap(),
            "kelvin.adder"
        );
        assert_eq!(feature_label("user_a/feature_x").unwrap(), "a.x");
        // Only the second token counts
        assert_eq!(
            feature_label("src/user_jo_smith/feature_big_thing.py").unwrap(),
            "jo.big"
        );
    }

    #[test]
    fn test_feature_label_malformed() {
        for bad in ["feature_x.py", "contrib/feature_x.py", "user_a/plain.py", "user_/feature_x.py"] {
            let err = feature_label(bad).unwrap_err();
            assert!(matches!(err, PruneError::MalformedPath { .. }), "{}", bad);
        }
    }

    #[test]
    fn test_compose_message() {
        let msg = compose_message(
            &[
                "features/contrib/user_kelvin/feature_adder.py",
                "features/contrib/user_micah/feature_ratio.py",
            ],
            &CommitMessageOptions::default(),
        )
        .unwrap();
        assert_eq!(msg, "Pruning Redundant Features: kelvin.adder, micah.ratio");
    }

    #[test]
    fn test_custom_template() {
        let options = CommitMessageOptions::with_template("chore: drop $features\n\nautomated");
        let msg = compose_message(&["u_a/f_x.py"], &options).unwrap();
        assert_eq!(msg, "chore: drop a.x\n\nautomated");
    }

    #[test]
    fn test_template_validation() {
        assert!(validate_template(DEFAULT_TEMPLATE).is_ok());
        assert!(validate_template("no placeholder").is_err());
        assert!(validate_template("$features and $features").is_err());
    }

    #[test]
    fn test_commit_draft_into_commit() {
        let parent = hash_bytes(b"parent");
        let tree = hash_bytes(b"tree");
        let draft = CommitDraft::compose(
            parent,
            tree,
            &["user_a/feature_x.py"],
            &CommitMessageOptions::default(),
            default_author(),
        )
        .unwrap();

        let commit = draft.into_commit(42);
        assert_eq!(commit.parent, Some(parent));
        assert_eq!(commit.tree, tree);
        assert_eq!(commit.message, "Pruning Redundant Features: a.x");
        assert_eq!(commit.author.to_string(), "Ballet <dai-lab@mit.edu>");
        assert_eq!(commit.ts_unix_ms, 42);
    }
}
