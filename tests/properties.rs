//! Whole-pipeline properties checked over a corpus of varied sources:
//! converting twice changes nothing the second time, repeated runs agree,
//! and pass-through subtrees survive byte for byte.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use wixcop::{Converter, Settings, TestType};

const CORPUS: &[&str] = &[
    "<Wix/>",
    "<?xml version='1.0'?><Wix xmlns='http://schemas.microsoft.com/wix/2006/wi'><Fragment></Fragment></Wix>",
    "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Wix>\n\t<Fragment>\n  <Property Id='A'\n     Value='1'>\n</Property>\n\n\n      <Property Id='B'><![CDATA[  x < y  ]]></Property>\n</Fragment>\n</Wix>",
    "<w:Wix xmlns:w='http://schemas.microsoft.com/wix/2006/wi' xmlns:util='http://schemas.microsoft.com/wix/UtilExtension'>\n <w:Fragment>\n  <util:User Id='u' Name='n'/>\n  <w:Component Guid='*' Win64='no'><w:File Source='a/b/c.dll'/></w:Component>\n </w:Fragment>\n</w:Wix>",
    "<?xml version='1.0' encoding='utf-8'?>\n<!-- header\n     spans lines -->\n<Wix xmlns='http://wixtoolset.org/schemas/v4/wxs'>\n<?define Ver = 1.0 ?>\n  <Bundle>\n    <Chain>\n      <ExePackage InstallCommand='/q' SuppressSignatureValidation='no'/>\n      <MsiPackage SuppressSignatureValidation='yes'>\n      </MsiPackage>\n    </Chain>\n  </Bundle>\n</Wix>",
    "<?xml version='1.0' encoding='utf-8'?><Wix xmlns='http://wixtoolset.org/schemas/v4/wxs'><Fragment><Property Id='Mixed'>a &amp; b <Sub/> c</Property></Fragment></Wix>",
    "<?xml version='1.0' encoding='utf-8'?>\n<Wix xmlns='http://wixtoolset.org/schemas/v4/wxs'>\n  <CustomAction Id='ca' BinaryKey='b' BinaryRef='c'/>\n  <Feature Id='f' Absent='sometimes'/>\n  <File Name='noSource'/>\n</Wix>",
    "<!DOCTYPE Wix [ <!ENTITY product 'Demo'> ]>\n<Wix xmlns='http://wixtoolset.org/schemas/v4/wxs'>\n   <Fragment Id='f'>&product;</Fragment>\n</Wix>",
];

fn run(source: &str, indent: usize, settings: &Settings) -> (String, usize) {
    let result = Converter::new(settings, indent).convert_str(source).unwrap();
    let count = result.count();
    (result.output, count)
}

#[test]
fn test_second_run_is_clean() {
    let settings = Settings::default();
    for indent in [2, 4] {
        for source in CORPUS {
            let (first, _) = run(source, indent, &settings);
            let (second, count) = run(&first, indent, &settings);
            assert_eq!(first, second, "output changed on second run of {source:?}");
            // rule errors recur on every run; nothing else may
            let again = Converter::new(&settings, indent).convert_str(&first).unwrap();
            assert!(
                again
                    .diagnostics
                    .iter()
                    .all(|d| d.test == TestType::RuleApplicationError),
                "unexpected fixes on second run of {source:?}: {:?}",
                again.diagnostics
            );
            assert_eq!(count, again.count());
        }
    }
}

#[test]
fn test_runs_are_deterministic() {
    let settings = Settings::default()
        .warn(TestType::NamespaceChanged)
        .ignore(TestType::AutoGuidUnnecessary);
    for source in CORPUS {
        let a = Converter::new(&settings, 4).convert_str(source).unwrap();
        let b = Converter::new(&settings, 4).convert_str(source).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_suppression_is_idempotent_too() {
    let settings = Settings::default()
        .ignore(TestType::WhitespacePrecedingNodeWrong)
        .ignore(TestType::DeclarationMissing)
        .ignore(TestType::NamespaceChanged);
    for source in CORPUS {
        let (first, _) = run(source, 4, &settings);
        let (second, _) = run(&first, 4, &settings);
        assert_eq!(first, second);
    }
}

#[test]
fn test_pass_through_fidelity() {
    let inner = "<Legacy xmlns='http://schemas.microsoft.com/wix/2006/wi'   Guid='*'>\n\t<Component Guid='*'>   </Component>\n<![CDATA[  raw  ]]>\n     <?include x.wxi?></Legacy>";
    let source = format!(
        "<?xml version='1.0' encoding='utf-8'?>\n<Wix xmlns='http://schemas.microsoft.com/wix/2006/wi'>\n  <Fragment>\n{inner}\n  </Fragment>\n</Wix>"
    );
    let settings = Settings::default().pass_through("Legacy");
    let (output, _) = run(&source, 2, &settings);
    assert!(output.contains(inner), "pass-through subtree altered:\n{output}");

    let (again, count) = run(&output, 2, &settings);
    assert_eq!(count, 0);
    assert_eq!(again, output);
}

#[test]
fn test_concurrent_conversions_agree() {
    let settings = &Settings::default();
    let expected: Vec<String> = CORPUS.iter().map(|s| run(s, 4, settings).0).collect();
    std::thread::scope(|scope| {
        let handles: Vec<_> = CORPUS
            .iter()
            .map(|source| scope.spawn(move || run(source, 4, settings).0))
            .collect();
        for (handle, want) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), want);
        }
    });
}
