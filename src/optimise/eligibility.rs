//! Which curves may receive spend.

use crate::curves::ResponseCurve;
use crate::domain::{ChannelSelection, CurveKey, Plan};

/// Keys of curves whose tier is live in their period and whose channel is
/// selected, in the curves' own `(period, tier, channel)` order.
///
/// Empty when nothing is live or no channel is selected; surfacing that to
/// the user is the caller's job.
pub fn compute_eligible(
    curves: &[ResponseCurve],
    plan: &Plan,
    channels: &ChannelSelection,
) -> Vec<CurveKey> {
    curves
        .iter()
        .filter(|c| plan.is_live(c.key.tier, c.key.period) && channels.contains(c.key.channel))
        .map(|c| c.key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{SpendGrid, build_curve_set, generate_curve_params};
    use crate::domain::{Channel, PeriodKind, Tier};

    fn curve_set() -> crate::curves::CurveSet {
        let params = generate_curve_params(5).unwrap();
        build_curve_set(&params, 12, SpendGrid::default()).unwrap()
    }

    #[test]
    fn only_live_tiers_and_selected_channels() {
        let set = curve_set();
        let mut plan = Plan::empty(12);
        plan.set_live(Tier::Xl, 5, true);
        plan.set_live(Tier::S, 0, true);
        let channels: ChannelSelection = [Channel::Crm, Channel::GoogleSearch].into_iter().collect();

        let keys = compute_eligible(set.curves(), &plan, &channels);
        assert_eq!(
            keys,
            vec![
                CurveKey::new(0, Tier::S, Channel::GoogleSearch),
                CurveKey::new(0, Tier::S, Channel::Crm),
                CurveKey::new(5, Tier::Xl, Channel::GoogleSearch),
                CurveKey::new(5, Tier::Xl, Channel::Crm),
            ]
        );
    }

    #[test]
    fn default_plan_with_all_channels() {
        let set = curve_set();
        let plan = Plan::default_for(PeriodKind::Month);
        let keys = compute_eligible(set.curves(), &plan, &ChannelSelection::all());
        assert_eq!(keys.len(), plan.live_count() * Channel::ALL.len());
    }

    #[test]
    fn empty_when_nothing_live_or_no_channels() {
        let set = curve_set();
        assert!(compute_eligible(set.curves(), &Plan::empty(12), &ChannelSelection::all()).is_empty());
        let plan = Plan::default_for(PeriodKind::Month);
        assert!(compute_eligible(set.curves(), &plan, &ChannelSelection::default()).is_empty());
    }
}
