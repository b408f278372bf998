//! Invariants that hold for any merge.

use vfx_ocio::{
    builtin, validate_config, Config, ConfigVersion, IssueCategory, Processor, ReferenceSpaceType,
    Severity, TransformDirection,
};
use vfx_ocio_merge::mergers::{section_mergers, MergeContext};
use vfx_ocio_merge::refspace::{is_identity_on, IDENTITY_TOLERANCE, STANDARD_PROBE};
use vfx_ocio_merge::{
    build_reference_converter, merge_config_pair, CollectingSink, MergeParameters, MergeStrategy,
    Overrides, ReferenceConverters, SectionMerger,
};

use crate::fixtures::{ap0_studio, rebase_params, rec709_show, show_params, yaml, SHOW, STUDIO};

fn duplicate_names(config: &Config) -> Vec<String> {
    validate_config(config)
        .into_iter()
        .filter(|i| i.category == IssueCategory::Duplicate)
        .map(|i| i.message)
        .collect()
}

fn variants(params: MergeParameters) -> Vec<MergeParameters> {
    [MergeStrategy::PreferInput, MergeStrategy::PreferBase]
        .into_iter()
        .flat_map(|strategy| {
            let params = params.clone().with_default_strategy(strategy);
            [params.clone().with_input_first(true), params.with_input_first(false)]
        })
        .collect()
}

#[test]
fn base_only_returns_the_base() {
    let base = yaml(STUDIO);
    let expected = base.to_yaml_string().unwrap();
    let params = show_params().with_default_strategy(MergeStrategy::BaseOnly);

    for input in [yaml(SHOW), rec709_show(), Config::new()] {
        let sink = CollectingSink::new();
        let merged = merge_config_pair(&params, &base, &input, &sink).unwrap();
        assert_eq!(merged.to_yaml_string().unwrap(), expected);
        assert!(sink.is_empty());
    }

    let params = params.with_overrides(Overrides {
        name: "renamed".into(),
        ..Overrides::default()
    });
    let sink = CollectingSink::new();
    let mut merged = merge_config_pair(&params, &base, &yaml(SHOW), &sink).unwrap();
    assert_eq!(merged.name(), "renamed");
    merged.set_name("studio");
    assert_eq!(merged.to_yaml_string().unwrap(), expected);
}

#[test]
fn reference_converters_invert_each_other() {
    let pairs = [
        (rec709_show(), ap0_studio()),
        (rec709_show(), builtin::reference()),
        (ap0_studio(), builtin::reference()),
    ];
    for (a, b) in &pairs {
        let there = build_reference_converter(a, b, ReferenceSpaceType::Scene).unwrap();
        let back = build_reference_converter(b, a, ReferenceSpaceType::Scene).unwrap();
        let proc = Processor::from_transform(&there, TransformDirection::Forward)
            .unwrap()
            .concat(&Processor::from_transform(&back, TransformDirection::Forward).unwrap());
        assert!(
            is_identity_on(&proc, &STANDARD_PROBE, IDENTITY_TOLERANCE),
            "{} <-> {}",
            a.name(),
            b.name()
        );
    }
}

#[test]
fn names_stay_unique_between_sections() {
    let cases = [
        (yaml(STUDIO), yaml(SHOW), show_params()),
        (ap0_studio(), rec709_show(), rebase_params()),
        (ap0_studio(), rec709_show(), rebase_params().with_avoid_duplicates(false)),
    ];
    for (base, input, params) in cases {
        for params in variants(params) {
            let converters = if params.adjust_input_reference_space {
                ReferenceConverters::build(&input, &base).unwrap()
            } else {
                ReferenceConverters::none()
            };
            let sink = CollectingSink::new();
            let ctx = MergeContext {
                base: &base,
                input: &input,
                params: &params,
                sink: &sink,
                converters: &converters,
            };
            let mut merged = base.clone();
            for merger in section_mergers() {
                merger.merge(&ctx, &mut merged).unwrap();
                let dupes = duplicate_names(&merged);
                assert!(dupes.is_empty(), "after {}: {dupes:?}", merger.name());
            }
        }
    }
}

#[test]
fn merged_references_resolve() {
    for params in variants(show_params()) {
        let sink = CollectingSink::new();
        let merged = merge_config_pair(&params, &yaml(STUDIO), &yaml(SHOW), &sink).unwrap();
        let errors: Vec<String> = validate_config(&merged)
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message)
            .collect();
        assert!(errors.is_empty(), "{errors:?}");
    }
}

#[test]
fn base_absorbs_duplicates() {
    let params = rebase_params().with_default_strategy(MergeStrategy::PreferBase);
    let sink = CollectingSink::new();
    let merged = merge_config_pair(&params, &ap0_studio(), &rec709_show(), &sink).unwrap();

    assert_eq!(merged.colorspaces().len(), 5);
    assert!(merged.colorspace("rec709").is_some());
    let ap0 = merged.colorspace("aces").unwrap();
    assert_eq!(ap0.name(), "ap0");
    assert_eq!(ap0.aliases(), ["ACES2065-1", "aces"]);
    let srgb = merged.colorspace("sRGB").unwrap();
    assert_eq!(srgb.name(), "sRGB - Texture");
    assert_eq!(srgb.aliases(), ["srgb_tx", "sRGB"]);
}

#[test]
fn duplicates_are_kept_when_asked() {
    let params = rebase_params().with_avoid_duplicates(false);
    let sink = CollectingSink::new();
    let merged = merge_config_pair(&params, &ap0_studio(), &rec709_show(), &sink).unwrap();

    assert_eq!(merged.colorspaces().len(), 7);
    assert!(merged.colorspace("sRGB - Texture").is_some());
    assert!(!merged.colorspace("ap0").unwrap().has_alias("ACES2065-1"));
    assert!(sink.contains(
        "The name of merged color space 'ACES2065-1' has a conflict with an alias in color space 'ap0'."
    ));
}

#[test]
fn version_never_goes_down() {
    let cases = [
        ((2, 1), (2, 0), (2, 1)),
        ((2, 0), (2, 3), (2, 3)),
        ((1, 0), (1, 0), (2, 0)),
    ];
    for (base_version, input_version, expected) in cases {
        let mut base = Config::new();
        base.set_version(ConfigVersion::new(base_version.0, base_version.1));
        let mut input = Config::new();
        input.set_version(ConfigVersion::new(input_version.0, input_version.1));

        let sink = CollectingSink::new();
        let params = MergeParameters::new().with_adjust_input_reference_space(false);
        let merged = merge_config_pair(&params, &base, &input, &sink).unwrap();
        let version = merged.version();
        assert!(version >= base.version().max(input.version()));
        assert!(version >= ConfigVersion::V2_0);
        assert_eq!(version, ConfigVersion::new(expected.0, expected.1));
    }
}
