#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use naval_duel_server::game::{MatchRegistry, Position, ShipPlacement};
use naval_duel_server::session::SessionCoordinator;
use naval_duel_server::ws::protocol::{ClientMsg, ServerMsg};

pub fn layout(ships: &[&[(i32, i32)]]) -> Vec<ShipPlacement> {
    ships
        .iter()
        .map(|cells| ShipPlacement::new(cells.iter().map(|&(x, y)| Position::new(x, y)).collect()))
        .collect()
}

pub fn standard_fleet() -> Vec<ShipPlacement> {
    layout(&[
        &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0)],
        &[(0, 2), (1, 2), (2, 2), (3, 2)],
        &[(5, 2), (6, 2), (7, 2)],
        &[(0, 4), (1, 4), (2, 4)],
        &[(4, 4), (5, 4)],
        &[(7, 4), (8, 4)],
        &[(0, 6), (1, 6)],
        &[(3, 6)],
        &[(5, 6)],
        &[(7, 6)],
        &[(9, 6)],
    ])
}

/// Submarine at (3, 3), nothing at (0, 0)
pub fn opponent_fleet() -> Vec<ShipPlacement> {
    layout(&[
        &[(5, 0), (6, 0), (7, 0), (8, 0), (9, 0)],
        &[(6, 2), (7, 2), (8, 2), (9, 2)],
        &[(0, 5), (1, 5), (2, 5)],
        &[(6, 4), (7, 4), (8, 4)],
        &[(0, 7), (1, 7)],
        &[(4, 5), (4, 6)],
        &[(8, 6), (8, 7)],
        &[(3, 3)],
        &[(0, 2)],
        &[(6, 9)],
        &[(2, 9)],
    ])
}

pub fn coordinator() -> SessionCoordinator {
    SessionCoordinator::new(Arc::new(MatchRegistry::new()), 16)
}

pub async fn next_msg(rx: &mut UnboundedReceiver<ServerMsg>) -> ServerMsg {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a server message")
        .expect("outbound channel closed")
}

/// Give spawned match actors a chance to run, then assert nothing arrived
pub async fn assert_silent(rx: &mut UnboundedReceiver<ServerMsg>) {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    if let Ok(msg) = rx.try_recv() {
        panic!("unexpected message: {msg:?}");
    }
}

pub struct Client {
    pub id: Uuid,
    pub rx: UnboundedReceiver<ServerMsg>,
}

impl Client {
    pub async fn connect(coordinator: &SessionCoordinator) -> Self {
        let (id, mut rx) = coordinator.connect();
        match next_msg(&mut rx).await {
            ServerMsg::Welcome { player_id, .. } => assert_eq!(player_id, id),
            other => panic!("expected welcome, got {other:?}"),
        }
        Self { id, rx }
    }

    pub async fn next(&mut self) -> ServerMsg {
        next_msg(&mut self.rx).await
    }

    pub async fn expect_error(&mut self, code: &str) {
        match self.next().await {
            ServerMsg::Error { code: got, .. } => assert_eq!(got, code),
            other => panic!("expected error {code}, got {other:?}"),
        }
    }
}

pub fn ready(name: &str) -> ClientMsg {
    ClientMsg::Ready {
        name: Some(name.to_string()),
    }
}

pub fn attack(match_id: Uuid, x: i32, y: i32) -> ClientMsg {
    ClientMsg::Attack {
        match_id,
        position: Position::new(x, y),
    }
}

pub fn place(match_id: Uuid, ships: Vec<ShipPlacement>) -> ClientMsg {
    ClientMsg::PlaceShips { match_id, ships }
}

/// Two connected players paired into one match
pub struct Duel {
    pub a: Client,
    pub b: Client,
    pub match_id: Uuid,
}

pub async fn pair(coordinator: &SessionCoordinator) -> Duel {
    let mut a = Client::connect(coordinator).await;
    let mut b = Client::connect(coordinator).await;

    coordinator.handle_message(a.id, ready("Alice")).await;
    assert_eq!(a.next().await, ServerMsg::Waiting);
    coordinator.handle_message(b.id, ready("Bob")).await;

    let match_id = match a.next().await {
        ServerMsg::Matched { match_id, .. } => match_id,
        other => panic!("expected matched, got {other:?}"),
    };
    match b.next().await {
        ServerMsg::Matched { match_id: id, .. } => assert_eq!(id, match_id),
        other => panic!("expected matched, got {other:?}"),
    }

    Duel { a, b, match_id }
}

/// Pair two players and place both fleets; A (player 0) has the turn
pub async fn start_battle(coordinator: &SessionCoordinator) -> Duel {
    let mut duel = pair(coordinator).await;
    let match_id = duel.match_id;

    coordinator
        .handle_message(duel.a.id, place(match_id, standard_fleet()))
        .await;
    assert_eq!(duel.a.next().await, ServerMsg::PlacementAccepted { match_id });

    coordinator
        .handle_message(duel.b.id, place(match_id, opponent_fleet()))
        .await;
    assert_eq!(duel.b.next().await, ServerMsg::PlacementAccepted { match_id });

    let start = ServerMsg::BattleStart {
        match_id,
        first_player_id: duel.a.id,
    };
    assert_eq!(duel.a.next().await, start);
    assert_eq!(duel.b.next().await, start);

    duel
}
