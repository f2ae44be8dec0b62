mod common;

use std::sync::mpsc;
use std::time::Duration;

use common::{wait_idle, MockChannel};
use ev3_serial::errors::JobError;
use ev3_serial::{Ev3, JobState};

const TIMEOUT: Duration = Duration::from_secs(5);

fn ev3() -> Ev3 {
    let (channel, _) = MockChannel::new();
    Ev3::new(channel).unwrap()
}

#[test]
fn idle_controller_reports_cancelled() {
    let ev3 = ev3();
    assert_eq!(ev3.state(), JobState::Idle);
    assert!(ev3.is_cancelled());

    // Nothing to cancel, must not fail
    ev3.cancel();
    ev3.cancel();
    assert_eq!(ev3.state(), JobState::Idle);
}

#[test]
fn second_run_is_rejected_while_first_keeps_going() {
    let ev3 = ev3();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (done_tx, done_rx) = mpsc::channel();

    ev3.run(move |_api| {
        release_rx.recv_timeout(TIMEOUT)?;
        done_tx.send("first")?;
        Ok(())
    })
    .unwrap();
    assert_eq!(ev3.state(), JobState::Running);
    assert!(!ev3.is_cancelled());

    let second = ev3.run(|_api| panic!("must never start"));
    assert!(matches!(second, Err(JobError::AlreadyRunning)));

    release_tx.send(()).unwrap();
    assert_eq!(done_rx.recv_timeout(TIMEOUT).unwrap(), "first");
    wait_idle(&ev3);
}

#[test]
fn controller_is_reusable_after_a_job() {
    let ev3 = ev3();
    let (tx, rx) = mpsc::channel();

    for i in 0..3 {
        let tx = tx.clone();
        ev3.run(move |_api| {
            tx.send(i)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), i);
        wait_idle(&ev3);
    }
}

#[test]
fn cancel_is_observed_by_the_job() {
    let ev3 = ev3();
    let (started_tx, started_rx) = mpsc::channel();
    let (stopped_tx, stopped_rx) = mpsc::channel();

    ev3.run(move |api| {
        started_tx.send(())?;
        while !api.is_cancelled() {
            std::thread::sleep(Duration::from_millis(1));
        }
        stopped_tx.send(())?;
        Ok(())
    })
    .unwrap();

    started_rx.recv_timeout(TIMEOUT).unwrap();
    ev3.cancel();
    assert!(ev3.is_cancelled());
    stopped_rx.recv_timeout(TIMEOUT).unwrap();
    wait_idle(&ev3);
}

#[test]
fn failing_job_returns_to_idle() {
    let ev3 = ev3();
    ev3.run(|_api| anyhow::bail!("sensor unplugged")).unwrap();
    wait_idle(&ev3);

    // And the controller still works
    let (tx, rx) = mpsc::channel();
    ev3.run(move |_api| {
        tx.send(())?;
        Ok(())
    })
    .unwrap();
    rx.recv_timeout(TIMEOUT).unwrap();
}

#[test]
fn panicking_job_returns_to_idle() {
    let ev3 = ev3();
    ev3.run(|_api| panic!("bug in the job")).unwrap();
    wait_idle(&ev3);
    assert!(ev3.run(|_api| Ok(())).is_ok());
    wait_idle(&ev3);
}

#[test]
fn cancel_flag_does_not_leak_into_the_next_job() {
    let ev3 = ev3();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    ev3.run(move |_api| {
        release_rx.recv_timeout(TIMEOUT)?;
        Ok(())
    })
    .unwrap();
    ev3.cancel();
    release_tx.send(()).unwrap();
    wait_idle(&ev3);

    let (tx, rx) = mpsc::channel();
    ev3.run(move |api| {
        tx.send(api.is_cancelled())?;
        Ok(())
    })
    .unwrap();
    assert!(!rx.recv_timeout(TIMEOUT).unwrap());
    wait_idle(&ev3);
}
