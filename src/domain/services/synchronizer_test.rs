use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::PollContext;
use super::Synchronizer;
use crate::domain::models::BotStep;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Sender;
use crate::domain::models::Session;
use crate::domain::models::SessionStatus;
use crate::domain::models::Transcript;

fn transcript(count: usize, status: SessionStatus) -> Transcript {
    let messages = (0..count)
        .map(|idx| return Message::text(Sender::Agent, &format!("msg {idx}")))
        .collect();

    return Transcript { messages, status };
}

fn chatting() -> PollContext {
    return PollContext {
        has_session: true,
        visible: true,
        step: BotStep::Chatting,
        upload_in_flight: false,
        recording: false,
    };
}

#[test]
fn it_skips_rendering_when_the_count_is_unchanged() {
    let mut session = Session::new("abc", "#0001", "Suporte");
    session.observe_count(3);

    let res = Synchronizer::apply(&mut session, &transcript(3, SessionStatus::Open), false);
    assert!(res.is_none());
    assert_eq!(session.last_known_message_count(), 3);
}

#[test]
fn it_renders_when_the_count_grows() -> Result<()> {
    let mut session = Session::new("abc", "#0001", "Suporte");
    session.observe_count(3);

    let messages = match Synchronizer::apply(&mut session, &transcript(4, SessionStatus::Open), false) {
        Some(messages) => messages,
        None => bail!("Expected a re-render"),
    };
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].content, "msg 3");
    assert_eq!(session.last_known_message_count(), 4);

    return Ok(());
}

#[test]
fn it_never_lowers_the_known_count_on_polls() {
    let mut session = Session::new("abc", "#0001", "Suporte");
    session.observe_count(5);

    let res = Synchronizer::apply(&mut session, &transcript(2, SessionStatus::Open), false);
    assert!(res.is_none());
    assert_eq!(session.last_known_message_count(), 5);
}

#[test]
fn it_rebases_the_count_on_a_shorter_forced_refresh() {
    let mut session = Session::new("abc", "#0001", "Suporte");
    session.observe_count(5);

    let res = Synchronizer::apply(&mut session, &transcript(2, SessionStatus::Open), true);
    assert_eq!(res.map(|e| return e.len()), Some(2));
    assert_eq!(session.last_known_message_count(), 2);

    let res = Synchronizer::apply(&mut session, &transcript(3, SessionStatus::Open), false);
    assert_eq!(res.map(|e| return e.len()), Some(3));
    assert_eq!(session.last_known_message_count(), 3);
}

#[test]
fn it_renders_forced_refreshes_with_an_equal_count() {
    let mut session = Session::new("abc", "#0001", "Suporte");
    session.observe_count(3);

    let res = Synchronizer::apply(&mut session, &transcript(3, SessionStatus::Open), true);
    assert!(res.is_some());
}

#[test]
fn it_only_fetches_in_chattable_visible_sessions() {
    let sync = Synchronizer::with_period(Duration::from_millis(3000));
    assert!(sync.should_fetch(&chatting()));
    assert!(sync.should_fetch(&PollContext {
        step: BotStep::Closed,
        ..chatting()
    }));

    assert!(!sync.should_fetch(&PollContext {
        has_session: false,
        ..chatting()
    }));
    assert!(!sync.should_fetch(&PollContext {
        visible: false,
        ..chatting()
    }));
    assert!(!sync.should_fetch(&PollContext {
        step: BotStep::WaitingPhone,
        ..chatting()
    }));
    assert!(!sync.should_fetch(&PollContext {
        upload_in_flight: true,
        ..chatting()
    }));
    assert!(!sync.should_fetch(&PollContext {
        recording: true,
        ..chatting()
    }));
}

#[test]
fn it_does_not_overlap_fetches() {
    let mut sync = Synchronizer::with_period(Duration::from_millis(3000));
    sync.begin_fetch();
    assert!(!sync.should_fetch(&chatting()));

    sync.fetch_done();
    assert!(sync.should_fetch(&chatting()));
}

#[test]
fn it_maps_status_transitions() {
    assert_eq!(
        Synchronizer::status_transition(BotStep::Chatting, SessionStatus::Closed),
        Some(BotStep::Closed)
    );
    assert_eq!(
        Synchronizer::status_transition(BotStep::Closed, SessionStatus::Open),
        Some(BotStep::Chatting)
    );
    assert_eq!(
        Synchronizer::status_transition(BotStep::Chatting, SessionStatus::Open),
        None
    );
    assert_eq!(
        Synchronizer::status_transition(BotStep::WaitingName, SessionStatus::Closed),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn it_ticks_every_period_until_stopped() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let mut sync = Synchronizer::with_period(Duration::from_millis(3000));
    sync.start("abc", tx);
    assert!(sync.is_running());

    tokio::time::advance(Duration::from_millis(2900)).await;
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());

    tokio::time::sleep(Duration::from_millis(200)).await;
    match rx.recv().await {
        Some(Event::PollTick(epoch)) => assert_eq!(epoch, "abc"),
        _ => bail!("Expected a poll tick"),
    }

    sync.stop();
    assert!(!sync.is_running());
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert!(rx.recv().await.is_none());

    return Ok(());
}
