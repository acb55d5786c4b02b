use std::path::Path;

use crate::error::ConfigError;
use crate::namespace::Namespace;

/// A source format that declares FileClasses and Policies.
///
/// Implementations add declarations to a [`Namespace`]; locating the
/// documents on disk is left to the caller. Several documents may be read
/// into the same namespace, in which case later ones can reference the
/// FileClasses of earlier ones.
pub trait ConfigFrontend: Send + Sync {
    /// File extensions this frontend reads, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Declare everything `content` describes into `namespace`.
    fn parse_into(&self, content: &str, namespace: &mut Namespace) -> Result<(), ConfigError>;

    /// Build a namespace from a single document.
    fn parse(&self, content: &str) -> Result<Namespace, ConfigError> {
        let mut namespace = Namespace::new();
        self.parse_into(content, &mut namespace)?;
        Ok(namespace)
    }

    /// Read `path` and declare its content into `namespace`.
    fn parse_file_into(&self, path: &Path, namespace: &mut Namespace) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("cannot read {}: {e}", path.display())))?;
        self.parse_into(&content, namespace)
    }

    /// Read `path` into a fresh namespace.
    fn parse_file(&self, path: &Path) -> Result<Namespace, ConfigError> {
        let mut namespace = Namespace::new();
        self.parse_file_into(path, &mut namespace)?;
        Ok(namespace)
    }

    /// Whether `path` carries one of [`extensions`](Self::extensions).
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;
    use crate::ir::condition::NAME;

    struct LinesFrontend;

    // Each line is `<name> <glob>` and declares one fileclass.
    impl ConfigFrontend for LinesFrontend {
        fn extensions(&self) -> &[&str] {
            &["lst"]
        }

        fn parse_into(&self, content: &str, namespace: &mut Namespace) -> Result<(), ConfigError> {
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                let (name, glob) = line
                    .split_once(' ')
                    .ok_or_else(|| ConfigError::Parse(format!("malformed line: {line}")))?;
                namespace.declare_fileclass(name, NAME.eq(glob.trim()))?;
            }
            Ok(())
        }
    }

    #[test]
    fn accepts_matches_extension() {
        let fe = LinesFrontend;
        assert!(fe.accepts(Path::new("/etc/shelve.d/fs1.lst")));
        assert!(!fe.accepts(Path::new("/etc/shelve.d/fs1.yaml")));
        assert!(!fe.accepts(Path::new("/etc/shelve.d/fs1")));
    }

    #[test]
    fn documents_share_a_namespace() {
        let fe = LinesFrontend;
        let mut ns = fe.parse("logs *.log\ntmp *.tmp\n").unwrap();
        assert_eq!(ns.fileclasses().count(), 2);

        let err = fe.parse_into("logs *.txt", &mut ns).unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::DuplicateName(_))));
        assert!(matches!(fe.parse("oops"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn parse_file_reports_unreadable_paths() {
        let err = LinesFrontend
            .parse_file(Path::new("/nonexistent/shelve/fs1.lst"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(ref m) if m.contains("/nonexistent/shelve/fs1.lst")));
    }
}
