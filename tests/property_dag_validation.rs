// tests/property_dag_validation.rs

use std::io::Write;

use proptest::prelude::*;

use taskrunner::config::load_and_validate;

/// Render `edge_count` tasks named `t0..t{n-1}`, each depending only on
/// lower-numbered tasks (so the generated graph is acyclic by construction),
/// into a TOML document.
fn render_acyclic_config(deps: &[Vec<usize>]) -> String {
    let mut doc = String::new();
    for (i, after) in deps.iter().enumerate() {
        doc.push_str(&format!("[task.t{i}]\ncmd = \"exit 0\"\n"));
        if !after.is_empty() {
            let names: Vec<String> = after.iter().map(|d| format!("\"t{d}\"")).collect();
            doc.push_str(&format!("after = [{}]\n", names.join(", ")));
        }
        doc.push('\n');
    }
    doc
}

proptest! {
    #[test]
    fn any_acyclic_dag_validates_successfully(n in 1usize..12) {
        // Each task i depends on a subset of {0, .., i-1} only, so no cycle
        // is constructible regardless of which subset is chosen.
        let deps: Vec<Vec<usize>> = (0..n)
            .map(|i| if i == 0 { vec![] } else { vec![i - 1] })
            .collect();

        let doc = render_acyclic_config(&deps);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.as_bytes()).unwrap();

        let cfg = load_and_validate(file.path());
        prop_assert!(cfg.is_ok(), "acyclic config rejected: {:?}\n{}", cfg.err(), doc);
        prop_assert_eq!(cfg.unwrap().task.len(), n);
    }

    #[test]
    fn a_chain_with_a_closing_edge_is_always_rejected_as_a_cycle(n in 2usize..12) {
        // t0 -> t1 -> ... -> t{n-1} -> t0: a cycle regardless of chain length.
        let mut deps: Vec<Vec<usize>> = (0..n)
            .map(|i| if i == 0 { vec![] } else { vec![i - 1] })
            .collect();
        deps[0] = vec![n - 1];

        let doc = render_acyclic_config(&deps);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.as_bytes()).unwrap();

        let cfg = load_and_validate(file.path());
        prop_assert!(cfg.is_err(), "cyclic config accepted:\n{}", doc);
    }
}
