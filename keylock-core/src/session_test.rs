#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    use crate::connection::{Connection, Inbound};
    use crate::error::{Error, Result};
    use crate::registry::Registry;
    use crate::session::Session;
    use crate::types::{ReleaseCause, ResourceKey, SessionOutcome, SessionState};

    /// Session side of an in-memory connection.
    struct ChannelConnection {
        inbound: mpsc::UnboundedReceiver<Inbound>,
        outbound: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl Connection for ChannelConnection {
        async fn send_text(&mut self, text: &str) -> Result<()> {
            self.outbound
                .send(text.to_string())
                .map_err(|_| Error::Connection("peer gone".into()))
        }

        async fn recv(&mut self) -> Inbound {
            self.inbound.recv().await.unwrap_or(Inbound::Closed)
        }

        async fn close(&mut self) {}
    }

    /// Client side. Dropping `to_session` looks like a disconnect.
    struct Peer {
        to_session: mpsc::UnboundedSender<Inbound>,
        from_session: mpsc::UnboundedReceiver<String>,
    }

    impl Peer {
        fn say(&self, text: &str) {
            self.to_session.send(Inbound::Text(text.to_string())).unwrap();
        }

        async fn expect_grant(&mut self) {
            let frame = timeout(Duration::from_secs(2), self.from_session.recv())
                .await
                .expect("grant timed out");
            assert_eq!(frame.as_deref(), Some("go"));
        }

        async fn expect_no_grant(&mut self) {
            let frame = timeout(Duration::from_millis(100), self.from_session.recv()).await;
            assert!(frame.is_err(), "unexpected frame: {:?}", frame);
        }
    }

    fn pair() -> (ChannelConnection, Peer) {
        let (to_session, inbound) = mpsc::unbounded_channel();
        let (outbound, from_session) = mpsc::unbounded_channel();
        (
            ChannelConnection { inbound, outbound },
            Peer { to_session, from_session },
        )
    }

    fn start(registry: &Arc<Registry>, key: &str) -> (JoinHandle<SessionOutcome>, Peer) {
        let (conn, peer) = pair();
        let registry = Arc::clone(registry);
        let key = ResourceKey::parse(key).unwrap();
        let task = tokio::spawn(async move { Session::new(key, conn).run(&registry).await });
        (task, peer)
    }

    async fn outcome(task: JoinHandle<SessionOutcome>) -> SessionOutcome {
        timeout(Duration::from_secs(2), task)
            .await
            .expect("session did not finish")
            .unwrap()
    }

    fn token_is_free(registry: &Registry, key: &str) -> bool {
        let token = registry.acquire_key_token(&ResourceKey::parse(key).unwrap());
        token.try_take().is_some()
    }

    #[test]
    fn test_new_session_carries_key_and_id() {
        let (conn, _peer) = pair();
        let session = Session::new(ResourceKey::parse("x").unwrap(), conn);
        assert_eq!(session.key().as_str(), "x");
        assert_eq!(session.id().len(), 10);
    }

    #[test]
    fn test_state_transitions_only_move_forward() {
        use SessionState::*;

        assert!(Connecting.can_advance_to(Waiting));
        assert!(Waiting.can_advance_to(Granted));
        assert!(Waiting.can_advance_to(Released));
        assert!(Granted.can_advance_to(Released));

        assert!(!Connecting.can_advance_to(Granted));
        assert!(!Connecting.can_advance_to(Released));
        assert!(!Granted.can_advance_to(Waiting));
        assert!(!Released.can_advance_to(Waiting));
        assert!(!Released.can_advance_to(Released));
    }

    #[tokio::test]
    async fn test_grant_then_explicit_unlock() {
        let registry = Arc::new(Registry::new());
        let (task, mut peer) = start(&registry, "x");

        peer.expect_grant().await;
        assert!(!token_is_free(&registry, "x"));

        peer.say("unlock");
        assert_eq!(outcome(task).await, SessionOutcome::Released(ReleaseCause::Unlock));
        assert!(token_is_free(&registry, "x"));
    }

    #[tokio::test]
    async fn test_release_keyword_is_case_insensitive() {
        let registry = Arc::new(Registry::new());
        let (task, mut peer) = start(&registry, "x");

        peer.expect_grant().await;
        peer.say("UnLoCk");
        assert_eq!(outcome(task).await, SessionOutcome::Released(ReleaseCause::Unlock));
    }

    #[tokio::test]
    async fn test_other_payloads_are_ignored_while_granted() {
        let registry = Arc::new(Registry::new());
        let (task, mut peer) = start(&registry, "x");

        peer.expect_grant().await;
        peer.say("hello");
        peer.say("unlock please");
        peer.to_session.send(Inbound::Other).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());

        peer.say("unlock");
        assert_eq!(outcome(task).await, SessionOutcome::Released(ReleaseCause::Unlock));
    }

    #[tokio::test]
    async fn test_contender_waits_until_holder_unlocks() {
        let registry = Arc::new(Registry::new());
        let (a, mut peer_a) = start(&registry, "x");
        peer_a.expect_grant().await;

        let (b, mut peer_b) = start(&registry, "x");
        peer_b.expect_no_grant().await;

        peer_a.say("unlock");
        assert_eq!(outcome(a).await, SessionOutcome::Released(ReleaseCause::Unlock));

        peer_b.expect_grant().await;
        peer_b.say("unlock");
        assert_eq!(outcome(b).await, SessionOutcome::Released(ReleaseCause::Unlock));
    }

    #[tokio::test]
    async fn test_disconnect_while_granted_releases_token() {
        let registry = Arc::new(Registry::new());
        let (task, mut peer) = start(&registry, "y");
        peer.expect_grant().await;

        drop(peer);
        assert_eq!(
            outcome(task).await,
            SessionOutcome::Released(ReleaseCause::Disconnect)
        );
        assert!(token_is_free(&registry, "y"));
    }

    #[tokio::test]
    async fn test_broken_read_counts_as_disconnect() {
        let registry = Arc::new(Registry::new());
        let (task, mut peer) = start(&registry, "y");
        peer.expect_grant().await;

        peer.to_session
            .send(Inbound::Broken("connection reset".into()))
            .unwrap();
        assert_eq!(
            outcome(task).await,
            SessionOutcome::Released(ReleaseCause::Disconnect)
        );
    }

    #[tokio::test]
    async fn test_failed_grant_send_still_releases() {
        let registry = Arc::new(Registry::new());
        let (conn, peer) = pair();
        let Peer { to_session, from_session } = peer;
        drop(from_session);

        let session = Session::new(ResourceKey::parse("z").unwrap(), conn);
        let result = session.run(&registry).await;
        assert_eq!(result, SessionOutcome::Released(ReleaseCause::Disconnect));
        assert!(token_is_free(&registry, "z"));
        drop(to_session);
    }

    #[tokio::test]
    async fn test_waiter_that_disconnects_never_takes_token() {
        let registry = Arc::new(Registry::new());
        let (a, mut peer_a) = start(&registry, "x");
        peer_a.expect_grant().await;

        let (b, peer_b) = start(&registry, "x");
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(peer_b);
        assert_eq!(outcome(b).await, SessionOutcome::Abandoned);

        let token = registry.acquire_key_token(&ResourceKey::parse("x").unwrap());
        assert_eq!(token.waiting(), 0);
        assert!(token.is_held());

        peer_a.say("unlock");
        assert_eq!(outcome(a).await, SessionOutcome::Released(ReleaseCause::Unlock));
        assert!(token_is_free(&registry, "x"));
    }

    #[tokio::test]
    async fn test_unlock_while_waiting_abandons_wait() {
        let registry = Arc::new(Registry::new());
        let (a, mut peer_a) = start(&registry, "x");
        peer_a.expect_grant().await;

        let (b, mut peer_b) = start(&registry, "x");
        peer_b.say("unlock");
        assert_eq!(outcome(b).await, SessionOutcome::Abandoned);
        assert!(peer_b.from_session.recv().await.is_none());

        peer_a.say("unlock");
        outcome(a).await;
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block_each_other() {
        let registry = Arc::new(Registry::new());
        let (p, mut peer_p) = start(&registry, "p");
        let (q, mut peer_q) = start(&registry, "q");

        peer_p.expect_grant().await;
        peer_q.expect_grant().await;

        drop(peer_q);
        drop(peer_p);
        outcome(p).await;
        outcome(q).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_at_most_one_granted_per_key() {
        let registry = Arc::new(Registry::new());
        let active = Arc::new(AtomicUsize::new(0));
        let granted = Arc::new(AtomicUsize::new(0));

        let mut clients = Vec::new();
        for _ in 0..8 {
            let (session, mut peer) = start(&registry, "shared");
            let active = Arc::clone(&active);
            let granted = Arc::clone(&granted);
            clients.push(tokio::spawn(async move {
                assert_eq!(peer.from_session.recv().await.as_deref(), Some("go"));
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                granted.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                peer.say("unlock");
                session.await.unwrap()
            }));
        }

        for client in clients {
            let result = timeout(Duration::from_secs(5), client)
                .await
                .expect("client starved")
                .unwrap();
            assert_eq!(result, SessionOutcome::Released(ReleaseCause::Unlock));
        }
        assert_eq!(granted.load(Ordering::SeqCst), 8);
    }
}
