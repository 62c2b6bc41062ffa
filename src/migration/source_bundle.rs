//! Deployment and component names declared in a stack configuration directory

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::debug;

use crate::archive;
use crate::error::Result;

const DEPLOYMENT_SUFFIX: &str = ".tfdeploy.hcl";
const COMPONENT_SUFFIXES: &[&str] = &[".tfcomponent.hcl", ".tfstack.hcl"];

/// Top-level declarations found in a source bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBundleDeclarations {
    pub deployments: BTreeSet<String>,
    pub components: BTreeSet<String>,
}

/// Scan the top-level configuration files of `dir`
pub fn scan(dir: &Path) -> Result<SourceBundleDeclarations> {
    let mut declarations = SourceBundleDeclarations::default();

    for (name, path) in archive::list_files(dir)? {
        if name.contains('/') {
            continue;
        }
        if name.ends_with(DEPLOYMENT_SUFFIX) {
            let content = fs::read_to_string(&path)?;
            declarations
                .deployments
                .extend(block_labels(&content, "deployment"));
        } else if COMPONENT_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            let content = fs::read_to_string(&path)?;
            declarations
                .components
                .extend(block_labels(&content, "component"));
        }
    }

    debug!(
        "Source bundle {} declares deployments {:?} and components {:?}",
        dir.display(),
        declarations.deployments,
        declarations.components
    );
    Ok(declarations)
}

/// Labels of top-level `<block> "label" {` lines outside of comments
fn block_labels(content: &str, block: &str) -> Vec<String> {
    strip_comments(content)
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let rest = line.strip_prefix(block)?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let rest = rest.trim_start().strip_prefix('"')?;
            let end = rest.find('"')?;
            Some(rest[..end].to_string())
        })
        .collect()
}

/// Blank out `#`, `//` and `/* */` comments, keeping line breaks
fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' | '\n' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            '#' => skip_line(&mut chars, &mut out),
            '/' if chars.peek() == Some(&'/') => skip_line(&mut chars, &mut out),
            c => out.push(c),
        }
    }
    out
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String) {
    for c in chars.by_ref() {
        if c == '\n' {
            out.push('\n');
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_labels() {
        let hcl = r#"
deployment "dev" {
  inputs = { deployment "nested" }
}
# deployment "commented" {}
deployment   "prod" {
}
deployments "not_a_block" {}
deployment_group "grp" {}
"#;
        assert_eq!(block_labels(hcl, "deployment"), vec!["dev", "prod"]);
    }

    #[test]
    fn test_block_labels_skip_block_comments() {
        let hcl = r#"
/*
deployment "retired" {
}
*/
deployment "live" { /* deployment "inline" { */ }
component "app" {
  source = "./modules/*" // deployment "in_line_comment" {
}
deployment "last" {}
"#;
        assert_eq!(block_labels(hcl, "deployment"), vec!["live", "last"]);
        assert_eq!(block_labels(hcl, "component"), vec!["app"]);
    }

    #[test]
    fn test_scan_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("deployments.tfdeploy.hcl"),
            "deployment \"dep_a\" {}\ndeployment \"dep_b\" {}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("components.tfcomponent.hcl"),
            "component \"network\" {\n  source = \"./modules/net\"\n}\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/other.tfdeploy.hcl"),
            "deployment \"ignored\" {}\n",
        )
        .unwrap();

        let declarations = scan(dir.path()).unwrap();
        assert_eq!(
            declarations.deployments,
            BTreeSet::from(["dep_a".to_string(), "dep_b".to_string()])
        );
        assert_eq!(
            declarations.components,
            BTreeSet::from(["network".to_string()])
        );
    }

    #[test]
    fn test_scan_legacy_stack_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.tfstack.hcl"),
            "component \"app\" {}\ncomponent \"db\" {}\n",
        )
        .unwrap();

        let declarations = scan(dir.path()).unwrap();
        assert!(declarations.deployments.is_empty());
        assert_eq!(declarations.components.len(), 2);
    }
}
