//! Zone policy evaluation.
//!
//! A pure, stateless mapping from a spot's static [`ZonePolicy`] and a
//! requested [`Transition`] to the ordered [`Directive`]s the reconciler
//! must carry out. Nothing here touches the registry or the sink.
//!
//! | Transition | Flags               | Directives                  |
//! |------------|---------------------|-----------------------------|
//! | enter      | `global_stop`       | `StopAll`, then `Start`*    |
//! | enter      | (none)              | `Start`*                    |
//! | leave      | `one_shot`          | `FinishRun`*                |
//! | leave      | (none)              | `StopAndRewind`*            |
//!
//! \* only when the spot can play. `looping` is not a transition
//! behavior; see [`resource_config`].

use smallvec::SmallVec;
use soundwalk_core::ZonePolicy;

/// Membership change of a spot between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The spot appeared in the surroundings.
    Enter,
    /// The spot disappeared from the surroundings.
    Leave,
}

/// One playback action derived from policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Silence every playing record before any entry is applied.
    StopAll,
    /// Connect the resource (idempotently) and play from position zero.
    Start,
    /// Keep the current run going and watch for its natural end.
    FinishRun,
    /// Pause and rewind to position zero.
    StopAndRewind,
}

/// Directives for one transition, in application order.
pub type Directives = SmallVec<[Directive; 2]>;

/// Playback configuration applied once when a resource is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Auto-repeat until explicitly stopped.
    pub looping: bool,
}

/// Map a zone policy and a transition to directives.
///
/// `can_play` is the record's fixed sound-availability flag. A
/// global-stop zone silences other spots even when it has no sound of
/// its own.
pub fn evaluate(policy: ZonePolicy, can_play: bool, transition: Transition) -> Directives {
    let mut out = Directives::new();
    match transition {
        Transition::Enter => {
            if policy.global_stop {
                out.push(Directive::StopAll);
            }
            if can_play {
                out.push(Directive::Start);
            }
        }
        Transition::Leave if can_play => {
            if policy.one_shot {
                out.push(Directive::FinishRun);
            } else {
                out.push(Directive::StopAndRewind);
            }
        }
        Transition::Leave => {}
    }
    out
}

/// Resource configuration derived from policy.
pub fn resource_config(policy: ZonePolicy) -> ResourceConfig {
    ResourceConfig {
        looping: policy.looping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(global_stop: bool, one_shot: bool, looping: bool) -> ZonePolicy {
        ZonePolicy {
            global_stop,
            one_shot,
            looping,
        }
    }

    #[test]
    fn plain_enter_starts() {
        assert_eq!(
            evaluate(ZonePolicy::PLAIN, true, Transition::Enter).as_slice(),
            &[Directive::Start]
        );
    }

    #[test]
    fn global_stop_precedes_start() {
        assert_eq!(
            evaluate(policy(true, false, false), true, Transition::Enter).as_slice(),
            &[Directive::StopAll, Directive::Start]
        );
    }

    #[test]
    fn silent_global_stop_still_stops_all() {
        assert_eq!(
            evaluate(policy(true, false, false), false, Transition::Enter).as_slice(),
            &[Directive::StopAll]
        );
    }

    #[test]
    fn leave_depends_on_one_shot() {
        assert_eq!(
            evaluate(policy(false, true, false), true, Transition::Leave).as_slice(),
            &[Directive::FinishRun]
        );
        assert_eq!(
            evaluate(ZonePolicy::PLAIN, true, Transition::Leave).as_slice(),
            &[Directive::StopAndRewind]
        );
    }

    #[test]
    fn silent_spots_get_no_audio_directives() {
        for flags in [
            ZonePolicy::PLAIN,
            policy(false, true, false),
            policy(false, false, true),
        ] {
            assert!(evaluate(flags, false, Transition::Enter).is_empty());
            assert!(evaluate(flags, false, Transition::Leave).is_empty());
        }
    }

    #[test]
    fn global_stop_has_no_effect_on_leave() {
        assert_eq!(
            evaluate(policy(true, false, false), true, Transition::Leave).as_slice(),
            &[Directive::StopAndRewind]
        );
    }

    #[test]
    fn looping_is_configuration_only() {
        assert_eq!(
            evaluate(policy(false, false, true), true, Transition::Enter).as_slice(),
            &[Directive::Start]
        );
        assert!(resource_config(policy(false, false, true)).looping);
        assert!(!resource_config(ZonePolicy::PLAIN).looping);
    }
}
