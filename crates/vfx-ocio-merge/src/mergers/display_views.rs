//! Displays, views, shared views, the virtual display, active lists and
//! viewing rules.
//!
//! Under the prefer strategies the merge walks the side listed first and
//! then appends what only the other side has. Which side wins a differing
//! view depends on both the strategy and `input_first`, so the walk takes a
//! `prefer_second` flag instead of knowing about base and input.

use vfx_ocio::{Config, Display, View, ViewingRules};

use super::{merge_lists, override_conflict, subtract_list, MergeContext, SectionMerger};
use crate::error::MergeResult;
use crate::params::{MergeStrategy, Section};

/// Merges everything under `displays` plus the related lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayViewsMerger;

struct Walk<'c, 'a> {
    ctx: &'c MergeContext<'a>,
    first: &'a Config,
    second: &'a Config,
    prefer_second: bool,
}

impl Walk<'_, '_> {
    fn conflict(&self, what: &str) -> MergeResult<()> {
        self.ctx.notify(&override_conflict(what))
    }

    fn shared_views(&self, merged: &mut Config) -> MergeResult<()> {
        for view in self.first.shared_views() {
            let other = self.second.shared_view(view.name());
            if let Some(other) = other {
                if !other.is_equivalent(view) {
                    self.conflict(&format!("shared_views: {}", view.name()))?;
                }
            }
            let chosen = match other {
                Some(other) if self.prefer_second => other,
                _ => view,
            };
            merged.add_shared_view(chosen.clone());
        }
        for view in self.second.shared_views() {
            if merged.shared_view(view.name()).is_none() {
                merged.add_shared_view(view.clone());
            }
        }
        Ok(())
    }

    fn displays(&self, merged: &mut Config) -> MergeResult<()> {
        for display in self.first.displays() {
            let name = display.name();
            if merged.display(name).is_none() {
                merged.add_display(Display::new(name));
            }
            let other = self.second.display(name);

            for view in display.views() {
                let vname = view.name();
                match other.filter(|o| o.has_view(vname)) {
                    Some(other) => {
                        let equal = self
                            .second
                            .display_view(name, vname)
                            .is_some_and(|o| o.is_equivalent(view));
                        if !equal {
                            self.conflict(&format!("display: {name}, view: {vname}"))?;
                        }
                        if !self.prefer_second {
                            merged.add_display_view(name, view.clone());
                        } else if other.has_shared_view(vname) {
                            merged.add_display_shared_view(name, vname);
                        } else if let Some(o) = other.view(vname) {
                            merged.add_display_view(name, o.clone());
                        }
                    }
                    None => merged.add_display_view(name, view.clone()),
                }
            }

            for vname in display.shared_views() {
                match other.filter(|o| self.prefer_second && o.has_view(vname)) {
                    Some(other) if other.has_shared_view(vname) => {
                        merged.add_display_shared_view(name, vname);
                    }
                    Some(other) => {
                        let mine = self.first.display_view(name, vname);
                        if let Some(theirs) = other.view(vname) {
                            if !mine.is_some_and(|m| m.is_equivalent(theirs)) {
                                self.conflict(&format!("display: {name}, view: {vname}"))?;
                            }
                            merged.add_display_view(name, theirs.clone());
                        }
                    }
                    None => merged.add_display_shared_view(name, vname),
                }
            }
        }
        add_unique_displays(self.second, merged);
        Ok(())
    }

    fn virtual_display(&self, merged: &mut Config) -> MergeResult<()> {
        let mine = self.first.virtual_display();
        let other = self.second.virtual_display();
        for view in mine.views() {
            let vname = view.name();
            if other.has_view(vname) {
                if !virtual_view(self.second, vname).is_some_and(|o| o.is_equivalent(view)) {
                    self.conflict(&format!("virtual_display: {vname}"))?;
                }
                if !self.prefer_second {
                    merged.virtual_display_mut().add_view(view.clone());
                } else if other.has_shared_view(vname) {
                    merged.virtual_display_mut().add_shared_view(vname);
                } else if let Some(o) = other.view(vname) {
                    merged.virtual_display_mut().add_view(o.clone());
                }
            } else {
                merged.virtual_display_mut().add_view(view.clone());
            }
        }

        for vname in mine.shared_views() {
            if self.prefer_second && other.has_view(vname) && !other.has_shared_view(vname) {
                if let Some(theirs) = other.view(vname) {
                    if !virtual_view(self.first, vname).is_some_and(|m| m.is_equivalent(theirs)) {
                        self.conflict(&format!("virtual_display: {vname}"))?;
                    }
                    merged.virtual_display_mut().add_view(theirs.clone());
                }
            } else {
                merged.virtual_display_mut().add_shared_view(vname.as_str());
            }
        }

        let merged_vd = merged.virtual_display_mut();
        for view in other.views() {
            if !merged_vd.has_view(view.name()) {
                merged_vd.add_view(view.clone());
            }
        }
        for vname in other.shared_views() {
            if !merged_vd.has_view(vname) {
                merged_vd.add_shared_view(vname.as_str());
            }
        }
        Ok(())
    }

    fn viewing_rules(&self, merged: &mut Config) -> MergeResult<()> {
        let mut rules = ViewingRules::new();
        let theirs = self.second.viewing_rules();
        for rule in self.first.viewing_rules().rules() {
            match theirs.get(rule.name()) {
                Some(other) if !other.is_equivalent(rule) => {
                    rules.add((if self.prefer_second { other } else { rule }).clone());
                    self.conflict(&format!("viewing_rules: {}", rule.name()))?;
                }
                _ => rules.add(rule.clone()),
            }
        }
        for rule in theirs.rules() {
            if rules.get(rule.name()).is_none() {
                rules.add(rule.clone());
            }
        }
        merged.set_viewing_rules(rules);
        Ok(())
    }
}

/// A virtual display view, following a shared view reference.
fn virtual_view<'c>(config: &'c Config, name: &str) -> Option<&'c View> {
    let vd = config.virtual_display();
    match vd.view(name) {
        Some(view) => Some(view),
        None if vd.has_shared_view(name) => config.shared_view(name),
        None => None,
    }
}

/// Adds the displays and views of `other` that `merged` lacks.
fn add_unique_displays(other: &Config, merged: &mut Config) {
    for display in other.displays() {
        let name = display.name();
        if merged.display(name).is_none() {
            merged.add_display(Display::new(name));
        }
        for view in display.views() {
            if !merged.display(name).is_some_and(|d| d.has_view(view.name())) {
                merged.add_display_view(name, view.clone());
            }
        }
        for vname in display.shared_views() {
            if !merged.display(name).is_some_and(|d| d.has_view(vname)) {
                merged.add_display_shared_view(name, vname);
            }
        }
    }
}

fn active_list(overridden: &[String], first: &[String], second: &[String]) -> Vec<String> {
    if overridden.is_empty() {
        merge_lists(first, second)
    } else {
        overridden.to_vec()
    }
}

fn clear_views(merged: &mut Config) {
    merged.clear_displays();
    merged.clear_shared_views();
    merged.virtual_display_mut().clear();
}

fn apply_active_overrides(ctx: &MergeContext<'_>, merged: &mut Config) {
    let overrides = &ctx.params.overrides;
    if !overrides.active_displays.is_empty() {
        merged.set_active_displays(overrides.active_displays.clone());
    }
    if !overrides.active_views.is_empty() {
        merged.set_active_views(overrides.active_views.clone());
    }
}

fn merge_both(ctx: &MergeContext<'_>, merged: &mut Config, prefer_second: bool) -> MergeResult<()> {
    let (first, second) = ctx.ordered();
    let walk = Walk {
        ctx,
        first,
        second,
        prefer_second,
    };
    clear_views(merged);
    walk.shared_views(merged)?;
    walk.displays(merged)?;
    walk.virtual_display(merged)?;

    let overrides = &ctx.params.overrides;
    merged.set_active_displays(active_list(
        &overrides.active_displays,
        first.active_displays(),
        second.active_displays(),
    ));
    merged.set_active_views(active_list(
        &overrides.active_views,
        first.active_views(),
        second.active_views(),
    ));
    walk.viewing_rules(merged)
}

impl SectionMerger for DisplayViewsMerger {
    fn name(&self) -> &'static str {
        "Display/Views"
    }

    fn strategy(&self, ctx: &MergeContext<'_>) -> MergeStrategy {
        ctx.strategy(Section::DisplayViews)
    }

    fn prefer_input(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_both(ctx, merged, !ctx.params.input_first)
    }

    fn prefer_base(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        merge_both(ctx, merged, ctx.params.input_first)
    }

    fn input_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        let input = ctx.input;
        clear_views(merged);
        for view in input.shared_views() {
            merged.add_shared_view(view.clone());
        }
        for display in input.displays() {
            merged.add_display(display.clone());
        }
        *merged.virtual_display_mut() = input.virtual_display().clone();

        let overrides = &ctx.params.overrides;
        merged.set_active_displays(active_list(&overrides.active_displays, input.active_displays(), &[]));
        merged.set_active_views(active_list(&overrides.active_views, input.active_views(), &[]));
        merged.set_viewing_rules(input.viewing_rules().clone());
        Ok(())
    }

    fn base_only(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        apply_active_overrides(ctx, merged);
        Ok(())
    }

    fn remove(&self, ctx: &MergeContext<'_>, merged: &mut Config) -> MergeResult<()> {
        let (base, input) = (ctx.base, ctx.input);
        clear_views(merged);

        for view in base.shared_views() {
            if input.shared_view(view.name()).is_none() {
                merged.add_shared_view(view.clone());
            }
        }

        for display in base.displays() {
            let name = display.name();
            let gone = |vname: &str| input.display(name).is_some_and(|d| d.has_view(vname));
            for view in display.views() {
                if !gone(view.name()) {
                    merged.add_display_view(name, view.clone());
                }
            }
            for vname in display.shared_views() {
                if !gone(vname) {
                    merged.add_display_shared_view(name, vname);
                }
            }
        }

        let input_vd = input.virtual_display();
        let merged_vd = merged.virtual_display_mut();
        for view in base.virtual_display().views() {
            if !input_vd.has_view(view.name()) {
                merged_vd.add_view(view.clone());
            }
        }
        for vname in base.virtual_display().shared_views() {
            if !input_vd.has_view(vname) {
                merged_vd.add_shared_view(vname.as_str());
            }
        }

        merged.set_active_displays(subtract_list(base.active_displays(), input.active_displays()));
        merged.set_active_views(subtract_list(base.active_views(), input.active_views()));

        let mut rules = ViewingRules::new();
        for rule in base.viewing_rules().rules() {
            if input.viewing_rules().get(rule.name()).is_none() {
                rules.add(rule.clone());
            }
        }
        merged.set_viewing_rules(rules);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ReferenceConverters;
    use crate::error::MergeError;
    use crate::mergers::test_util::{ctx, yaml};
    use crate::notify::CollectingSink;
    use crate::params::{MergeParameters, Overrides};

    const BASE: &str = r#"
ocio_profile_version: 2
shared_views:
  - !<View> {name: SHARED_1, view_transform: vt, display_colorspace: disp_cs}
  - !<View> {name: SHARED_2, colorspace: lin}
displays:
  DISP_1:
    - !<View> {name: VIEW_1, colorspace: lin}
    - !<View> {name: VIEW_2, colorspace: log}
    - !<Views> [SHARED_1]
  DISP_2:
    - !<View> {name: VIEW_3, colorspace: lin}
virtual_display:
  - !<View> {name: VIRTUAL_1, colorspace: lin}
  - !<Views> [SHARED_2]
active_displays: [DISP_1, DISP_2]
active_views: [VIEW_1, SHARED_1]
viewing_rules:
  - !<Rule> {name: RULE_1, colorspaces: lin}
  - !<Rule> {name: RULE_2, encodings: log}
"#;

    const INPUT: &str = r#"
ocio_profile_version: 2
shared_views:
  - !<View> {name: SHARED_1, view_transform: other_vt, display_colorspace: disp_cs}
  - !<View> {name: SHARED_3, colorspace: log}
displays:
  DISP_1:
    - !<View> {name: VIEW_1, colorspace: log}
    - !<View> {name: VIEW_4, colorspace: lin}
    - !<Views> [SHARED_3]
  DISP_3:
    - !<View> {name: VIEW_5, colorspace: lin}
virtual_display:
  - !<View> {name: VIRTUAL_1, colorspace: log}
active_displays: [DISP_3, DISP_1]
active_views: [VIEW_4]
viewing_rules:
  - !<Rule> {name: RULE_1, colorspaces: log}
  - !<Rule> {name: RULE_3, colorspaces: lin}
"#;

    fn run(params: &MergeParameters) -> (Config, CollectingSink) {
        let base = yaml(BASE);
        let input = yaml(INPUT);
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let mut merged = base.clone();
        DisplayViewsMerger
            .merge(&ctx(&base, &input, params, &sink, &conv), &mut merged)
            .unwrap();
        (merged, sink)
    }

    fn display_names(config: &Config) -> Vec<&str> {
        config.displays().iter().map(|d| d.name()).collect()
    }

    fn view_names<'c>(config: &'c Config, display: &str) -> Vec<&'c str> {
        config.display(display).unwrap().view_names().collect()
    }

    #[test]
    fn prefer_input_input_first() {
        let (merged, sink) = run(&MergeParameters::new());

        let shared: Vec<&str> = merged.shared_views().iter().map(|v| v.name()).collect();
        assert_eq!(shared, ["SHARED_1", "SHARED_3", "SHARED_2"]);
        assert_eq!(merged.shared_view("SHARED_1").unwrap().view_transform(), Some("other_vt"));

        assert_eq!(display_names(&merged), ["DISP_1", "DISP_3", "DISP_2"]);
        assert_eq!(view_names(&merged, "DISP_1"), ["VIEW_1", "VIEW_4", "VIEW_2", "SHARED_3", "SHARED_1"]);
        assert_eq!(merged.display_view_colorspace("DISP_1", "VIEW_1").as_deref(), Some("log"));

        assert_eq!(merged.virtual_display().view("VIRTUAL_1").unwrap().colorspace(), "log");
        assert!(merged.virtual_display().has_shared_view("SHARED_2"));

        assert_eq!(merged.active_displays(), ["DISP_3", "DISP_1", "DISP_2"]);
        assert_eq!(merged.active_views(), ["VIEW_4", "VIEW_1", "SHARED_1"]);

        let rules: Vec<&str> = merged.viewing_rules().rules().iter().map(|r| r.name()).collect();
        assert_eq!(rules, ["RULE_1", "RULE_3", "RULE_2"]);
        assert_eq!(merged.viewing_rules().get("RULE_1").unwrap().colorspaces(), ["log"]);

        assert_eq!(sink.warnings(), [
            "The Input config contains a value that would override the Base config: shared_views: SHARED_1",
            "The Input config contains a value that would override the Base config: display: DISP_1, view: VIEW_1",
            "The Input config contains a value that would override the Base config: virtual_display: VIRTUAL_1",
            "The Input config contains a value that would override the Base config: viewing_rules: RULE_1",
        ]);
    }

    #[test]
    fn prefer_base_base_first() {
        let params = MergeParameters::new()
            .with_strategy(Section::DisplayViews, MergeStrategy::PreferBase)
            .with_input_first(false);
        let (merged, sink) = run(&params);
        assert_eq!(merged.shared_view("SHARED_1").unwrap().view_transform(), Some("vt"));
        assert_eq!(display_names(&merged), ["DISP_1", "DISP_2", "DISP_3"]);
        assert_eq!(view_names(&merged, "DISP_1"), ["VIEW_1", "VIEW_2", "VIEW_4", "SHARED_1", "SHARED_3"]);
        assert_eq!(merged.display_view_colorspace("DISP_1", "VIEW_1").as_deref(), Some("lin"));
        assert_eq!(merged.active_displays(), ["DISP_1", "DISP_2", "DISP_3"]);
        assert_eq!(merged.viewing_rules().get("RULE_1").unwrap().colorspaces(), ["lin"]);
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn prefer_input_base_first_takes_input_values() {
        let (merged, _) = run(&MergeParameters::new().with_input_first(false));
        assert_eq!(merged.shared_view("SHARED_1").unwrap().view_transform(), Some("other_vt"));
        assert_eq!(merged.display_view_colorspace("DISP_1", "VIEW_1").as_deref(), Some("log"));
        assert_eq!(merged.active_displays(), ["DISP_1", "DISP_2", "DISP_3"]);
    }

    #[test]
    fn active_overrides_win() {
        let params = MergeParameters::new().with_overrides(Overrides {
            active_displays: vec!["DISP_2".into()],
            ..Overrides::default()
        });
        let (merged, _) = run(&params);
        assert_eq!(merged.active_displays(), ["DISP_2"]);

        let params = params.with_default_strategy(MergeStrategy::BaseOnly);
        let (merged, sink) = run(&params);
        assert_eq!(merged.active_displays(), ["DISP_2"]);
        assert_eq!(merged.active_views(), ["VIEW_1", "SHARED_1"]);
        assert_eq!(display_names(&merged), ["DISP_1", "DISP_2"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn input_only_replaces_everything() {
        let params = MergeParameters::new().with_strategy(Section::DisplayViews, MergeStrategy::InputOnly);
        let (merged, sink) = run(&params);
        assert_eq!(display_names(&merged), ["DISP_1", "DISP_3"]);
        assert_eq!(merged.shared_views().len(), 2);
        assert!(!merged.virtual_display().has_view("SHARED_2"));
        assert_eq!(merged.active_displays(), ["DISP_3", "DISP_1"]);
        assert_eq!(merged.viewing_rules().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn remove_drops_input_views() {
        let params = MergeParameters::new().with_strategy(Section::DisplayViews, MergeStrategy::Remove);
        let (merged, _) = run(&params);
        let shared: Vec<&str> = merged.shared_views().iter().map(|v| v.name()).collect();
        assert_eq!(shared, ["SHARED_2"]);
        assert_eq!(view_names(&merged, "DISP_1"), ["VIEW_2", "SHARED_1"]);
        assert_eq!(view_names(&merged, "DISP_2"), ["VIEW_3"]);
        assert!(merged.virtual_display().view("VIRTUAL_1").is_none());
        assert!(merged.virtual_display().has_shared_view("SHARED_2"));
        assert_eq!(merged.active_displays(), ["DISP_2"]);
        assert_eq!(merged.active_views(), ["VIEW_1", "SHARED_1"]);
        let rules: Vec<&str> = merged.viewing_rules().rules().iter().map(|r| r.name()).collect();
        assert_eq!(rules, ["RULE_2"]);
    }

    #[test]
    fn shared_view_conflict_is_fatal() {
        let base = yaml(BASE);
        let input = yaml(INPUT);
        let params = MergeParameters::new().with_error_on_conflict(true);
        let sink = CollectingSink::new();
        let conv = ReferenceConverters::none();
        let mut merged = base.clone();
        let err = DisplayViewsMerger
            .merge(&ctx(&base, &input, &params, &sink, &conv), &mut merged)
            .unwrap_err();
        match err {
            MergeError::Conflict(msg) => assert!(msg.contains("shared_views: SHARED_1")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
