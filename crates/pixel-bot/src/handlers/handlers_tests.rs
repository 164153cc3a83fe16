#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pixel_types::{BanPatterns, CommandCall, Identity, StoreRecord};
    use tokio::time::Instant;

    use crate::context::{BotState, Settings};
    use crate::dispatcher::{Dispatch, Dispatcher, Gates};
    use crate::flags::RuntimeFlags;
    use crate::handlers;
    use crate::responder::Reply;
    use crate::store::{AclStore, MemoryBackend};

    struct Harness {
        dispatcher: Dispatcher,
        state: BotState,
        backend: MemoryBackend,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_record(record())
        }

        fn with_record(record: StoreRecord) -> Self {
            let backend = MemoryBackend::new(record);
            let store = AclStore::load(backend.clone()).unwrap();
            let state = BotState::new(store, RuntimeFlags::default(), Settings::default());
            let dispatcher = handlers::dispatcher(Gates {
                cooldown: Duration::from_secs(60),
                bans: BanPatterns::new(["austin"]),
                super_user: Identity::new("zlef"),
            });
            Self {
                dispatcher,
                state,
                backend,
                now: Instant::now(),
            }
        }

        /// Dispatch and return only the handler's own replies (the audit line
        /// is always first when the handler runs).
        fn run(&mut self, sender: &str, name: &str, argument: &str) -> (Dispatch, Vec<Reply>) {
            let mut replies = Vec::new();
            let outcome = self.dispatcher.dispatch(
                &mut self.state,
                &Identity::new(sender),
                &CommandCall::new(name, argument),
                self.now,
                &mut replies,
            );
            // Keep member calls off each other's cooldown.
            self.now += Duration::from_secs(61);
            if matches!(outcome, Dispatch::Handled | Dispatch::Failed) {
                replies.remove(0);
            }
            (outcome, replies)
        }

        fn texts(&mut self, sender: &str, name: &str, argument: &str) -> Vec<String> {
            self.run(sender, name, argument)
                .1
                .into_iter()
                .map(|r| r.text)
                .collect()
        }
    }

    fn record() -> StoreRecord {
        let mut rec = StoreRecord::default();
        rec.whitelist.insert(Identity::new("zlef"));
        rec.whitelist.insert(Identity::new("helper"));
        rec.alt_traders.insert(Identity::new("alty"));
        rec.profanity = vec!["darn".into()];
        rec.shortcuts.insert("ore".into(), "Mining#Ores".into());
        rec
    }

    // ── wiki ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_wiki_builds_search_link() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("bob", "wiki", "iron bar"),
            vec!["https://idle-pixel.wiki/index.php?search=iron+bar"]
        );
    }

    #[test]
    fn test_wiki_cuts_at_at_sign() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("bob", "wiki", "oak @alice"),
            vec!["https://idle-pixel.wiki/index.php?search=oak"]
        );
    }

    #[test]
    fn test_wiki_substitutes_shortcut() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("bob", "wiki", "ORE"),
            vec!["https://idle-pixel.wiki/index.php?search=Mining%23Ores"]
        );
    }

    #[test]
    fn test_wiki_empty_argument_gives_usage() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("bob", "wiki", ""),
            vec!["Use ?wiki <search term>. Cooldown applied, try again in 60 seconds"]
        );
    }

    #[test]
    fn test_wiki_alt_trader_redirect() {
        let mut h = Harness::new();
        let texts = h.texts("alty", "wiki", "anything");
        assert_eq!(
            texts[0],
            "I think this is the link you're looking for: https://idle-pixel.com/rules/ (under alt trading)"
        );
        assert!(texts[1].starts_with("alty triggered alt trader response @ "));
    }

    #[test]
    fn test_wiki_profanity_is_audit_only() {
        let mut h = Harness::new();
        let (_, replies) = h.run("bob", "wiki", "darn it");
        assert_eq!(replies.len(), 1);
        assert!(replies[0].force_debug);
        assert!(replies[0].text.starts_with("Profanity detected from bob at "));
    }

    #[test]
    fn test_wiki_hi() {
        let mut h = Harness::new();
        let (_, replies) = h.run("bob", "wiki", "Hi");
        assert_eq!(
            replies[0],
            Reply::public("I'm not ChatGPT, I won't pretend to be your girlfriend.")
        );
        assert!(replies[1].force_debug);
    }

    #[test]
    fn test_wiki_user_joke_prefix() {
        let mut rec = record();
        rec.jokes
            .users
            .insert(Identity::new("cammyrock"), vec!["Who's a good girl!".into()]);
        let mut h = Harness::with_record(rec);
        h.state.settings.user_joke_odds = 1;

        let texts = h.texts("CammyRock", "wiki", "oak");
        assert_eq!(texts[0], "Who's a good girl! https://idle-pixel.wiki/index.php?search=oak");
        assert!(texts[1].starts_with("cammyrock triggered a joke with oak at "));

        h.state.flags.jokes = false;
        assert_eq!(
            h.texts("cammyrock", "wiki", "oak"),
            vec!["https://idle-pixel.wiki/index.php?search=oak"]
        );
    }

    // ── help / woof / axe ─────────────────────────────────────────────────────

    #[test]
    fn test_help_for_whitelisted_lists_commands() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("helper", "help", ""),
            vec!["Available functions: ?wiki, ?add, ?remove, ?keys, ?axe"]
        );
    }

    #[test]
    fn test_help_for_members_without_jokes_falls_back() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("bob", "help", ""),
            vec!["Use ?wiki <search term> to search the wiki"]
        );
    }

    #[test]
    fn test_help_jokes_do_not_repeat() {
        let mut rec = record();
        rec.jokes.help = vec!["one".into(), "two".into()];
        let mut h = Harness::with_record(rec);
        let mut last = h.texts("bob", "help", "").remove(0);
        for _ in 0..20 {
            let next = h.texts("bob", "help", "").remove(0);
            assert_ne!(next, last);
            last = next;
        }
    }

    #[test]
    fn test_woof() {
        let mut h = Harness::new();
        assert_eq!(h.texts("bob", "woof", ""), vec!["Woof!"]);
    }

    #[test]
    fn test_axe_is_whitelist_only_and_rotates() {
        let mut rec = record();
        rec.jokes.axe = vec!["chop".into(), "timber".into()];
        let mut h = Harness::with_record(rec);
        assert_eq!(h.run("bob", "axe", "").0, Dispatch::Denied);
        let first = h.texts("zlef", "axe", "").remove(0);
        let second = h.texts("zlef", "axe", "").remove(0);
        assert_ne!(first, second);
    }

    // ── shortcuts ─────────────────────────────────────────────────────────────

    #[test]
    fn test_add_lookup_reject_remove_readd() {
        let mut h = Harness::new();

        assert_eq!(h.texts("zlef", "add", "foo:bar"), vec!["foo has been added as a shortcut"]);
        assert_eq!(h.backend.saves(), 1);
        assert_eq!(
            h.texts("bob", "wiki", "foo"),
            vec!["https://idle-pixel.wiki/index.php?search=bar"]
        );

        assert_eq!(
            h.texts("zlef", "add", "foo:baz"),
            vec!["That key is already in use for bar. Use ?keys to view the err... Keys..."]
        );
        assert_eq!(h.backend.saves(), 1);

        assert_eq!(h.texts("zlef", "remove", "foo"), vec!["foo has been removed."]);
        assert_eq!(h.texts("zlef", "add", "foo:baz"), vec!["foo has been added as a shortcut"]);
        assert_eq!(h.backend.saves(), 3);
        assert_eq!(h.backend.record().shortcuts.get("foo").unwrap(), "baz");
    }

    #[test]
    fn test_add_requires_key_value() {
        let mut h = Harness::new();
        assert_eq!(h.texts("zlef", "add", "nocolon"), vec!["Expected key:value, item not added"]);
        assert_eq!(h.texts("zlef", "add", ":value"), vec!["Expected key:value, item not added"]);
        assert_eq!(h.backend.saves(), 0);
    }

    #[test]
    fn test_remove_missing_key() {
        let mut h = Harness::new();
        assert_eq!(
            h.texts("zlef", "remove", "ghost"),
            vec!["The key ghost doesn't exist. Nothing to remove."]
        );
    }

    #[test]
    fn test_members_cannot_edit_shortcuts() {
        let mut h = Harness::new();
        assert_eq!(h.run("bob", "add", "foo:bar").0, Dispatch::Denied);
        assert_eq!(h.run("bob", "remove", "ore").0, Dispatch::Denied);
        assert_eq!(h.backend.saves(), 0);
    }

    #[test]
    fn test_save_failure_is_reported_and_change_stands() {
        let mut h = Harness::new();
        h.backend.fail_saves(true);
        let (outcome, replies) = h.run("zlef", "add", "foo:bar");
        assert_eq!(outcome, Dispatch::Handled);
        assert!(replies[0].force_debug);
        assert!(replies[0].text.starts_with("Failed to save changes from add"));
        assert_eq!(replies[1].text, "foo has been added as a shortcut");
        assert_eq!(h.state.store.shortcut("foo"), Some("bar"));
    }

    #[test]
    fn test_keys_single_page() {
        let mut h = Harness::new();
        h.texts("zlef", "add", "bar:Smelting");
        assert_eq!(h.texts("zlef", "keys", ""), vec!["Keys page 1 of 1: bar, ore"]);
    }

    // ── flags ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_toggle_debug() {
        let mut h = Harness::new();
        let (_, replies) = h.run("zlef", "debug", "false");
        assert!(!h.state.flags.debug);
        assert!(replies[0].force_debug);
        assert!(replies[0].text.starts_with("debug set to false."));

        h.run("zlef", "debug", "");
        assert!(h.state.flags.debug);
    }

    #[test]
    fn test_toggle_bad_value() {
        let mut h = Harness::new();
        let texts = h.texts("zlef", "local", "yes please");
        assert_eq!(
            texts,
            vec!["Failed to set local value, expects \"true\" or \"false\", received yes please"]
        );
        assert!(!h.state.flags.local);
    }

    #[test]
    fn test_name_sets_impersonation_identity() {
        let mut h = Harness::new();
        h.run("zlef", "name", "Tester");
        assert_eq!(h.state.flags.fake_identity, Identity::new("tester"));
    }

    #[test]
    fn test_say_relays_verbatim() {
        let mut h = Harness::new();
        assert_eq!(h.texts("zlef", "say", "Hello ~ World"), vec!["Hello ~ World"]);
        assert_eq!(h.run("bob", "say", "hi").0, Dispatch::Denied);
    }

    // ── lists ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_allow_is_super_user_only() {
        let mut h = Harness::new();
        assert_eq!(h.run("helper", "allow", "newbie").0, Dispatch::Denied);
        assert_eq!(h.texts("zlef", "allow", "Newbie"), vec!["newbie added to the whitelist"]);
        assert!(h.state.store.record().is_whitelisted(&"newbie".into()));
        assert_eq!(h.backend.saves(), 1);
        assert_eq!(h.texts("zlef", "disallow", "newbie"), vec!["newbie removed from the whitelist"]);
        assert_eq!(h.backend.saves(), 2);
    }

    #[test]
    fn test_ban_stops_further_commands() {
        let mut h = Harness::new();
        assert_eq!(h.texts("helper", "ban", "bob"), vec!["bob added to the blacklist"]);
        assert_eq!(h.run("bob", "wiki", "oak").0, Dispatch::Banned);
        assert_eq!(h.texts("helper", "unban", "bob"), vec!["bob removed from the blacklist"]);
        assert_eq!(h.run("bob", "wiki", "oak").0, Dispatch::Handled);
    }

    #[test]
    fn test_unchanged_list_edit_does_not_save() {
        let mut h = Harness::new();
        assert_eq!(h.texts("zlef", "unalttrader", "bob"), vec!["bob is not on the alt trader list"]);
        assert_eq!(h.texts("zlef", "alttrader", "alty"), vec!["alty is already on the alt trader list"]);
        assert_eq!(h.backend.saves(), 0);
    }

    #[test]
    fn test_list_edit_without_player_gives_usage() {
        let mut h = Harness::new();
        assert_eq!(h.texts("zlef", "ban", ""), vec!["Use ?ban <player>"]);
    }
}
