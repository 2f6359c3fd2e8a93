//! Whole games driven through the registry and match actors.

use broadside_match::{
    FleetRule, LobbyCode, Match, MatchConfig, MatchError, MatchPhase, MatchRegistry, Piece,
    PlacementOutcome, RuleSet,
};
use broadside_protocol::{Coordinate, PlayerId, ServerEvent};
use tokio::sync::mpsc;

const A: PlayerId = PlayerId(1);
const B: PlayerId = PlayerId(2);

fn c(row: i32, col: i32) -> Coordinate {
    Coordinate::new(row, col)
}

fn horizontal(row: i32, col: i32, len: i32) -> Piece {
    Piece::new((0..len).map(|i| c(row, col + i)).collect())
}

/// Rows 0, 2 and 4 hold the fleet; rows 6..10 are open water.
fn classic_fleet() -> Vec<Piece> {
    vec![
        horizontal(0, 0, 4),
        horizontal(0, 5, 3),
        horizontal(2, 0, 3),
        horizontal(2, 4, 2),
        horizontal(2, 7, 2),
        horizontal(4, 0, 2),
        horizontal(4, 3, 1),
        horizontal(4, 5, 1),
        horizontal(4, 7, 1),
        horizontal(4, 9, 1),
    ]
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// End-to-end through the actor
// =========================================================================

#[tokio::test]
async fn test_full_game_player_b_wins() {
    let mut registry = MatchRegistry::with_codes(MatchConfig::default(), || {
        LobbyCode::parse("ABC123").unwrap()
    });
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();

    // Lobby.
    let code = registry.create(A, tx_a).unwrap();
    assert_eq!(code.as_str(), "ABC123");
    let handle = registry.join("ABC123", B, tx_b).await.unwrap();
    assert_eq!(handle.info().await.unwrap().phase, MatchPhase::Placing);
    drain(&mut rx_a);
    drain(&mut rx_b);

    // Placement.
    assert_eq!(
        handle.place(A, classic_fleet()).await.unwrap(),
        PlacementOutcome::Waiting
    );
    assert_eq!(drain(&mut rx_a), vec![ServerEvent::PlacementConfirmed]);
    assert!(drain(&mut rx_b).is_empty());

    assert_eq!(
        handle.place(B, classic_fleet()).await.unwrap(),
        PlacementOutcome::AllReady { first_turn: A }
    );
    assert_eq!(
        drain(&mut rx_a),
        vec![ServerEvent::AllReady {
            current_turn: A,
            your_turn: true
        }]
    );
    assert_eq!(
        drain(&mut rx_b),
        vec![
            ServerEvent::PlacementConfirmed,
            ServerEvent::AllReady {
                current_turn: A,
                your_turn: false
            },
        ]
    );
    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, MatchPhase::Playing);
    assert_eq!(info.turn, Some(A));

    // A misses; the turn passes.
    handle.shoot(A, c(9, 9)).await.unwrap();
    assert_eq!(
        drain(&mut rx_a),
        vec![
            ServerEvent::ShotResult {
                row: 9,
                col: 9,
                hit: false,
                sunk: false,
                piece: None
            },
            ServerEvent::TurnInfo { your_turn: false },
        ]
    );
    assert_eq!(
        drain(&mut rx_b),
        vec![
            ServerEvent::OpponentShot {
                row: 9,
                col: 9,
                hit: false
            },
            ServerEvent::TurnInfo { your_turn: true },
        ]
    );

    // B sinks a 1-cell piece and keeps the turn.
    let outcome = handle.shoot(B, c(4, 3)).await.unwrap();
    assert_eq!(outcome.next_turn, Some(B));
    assert_eq!(
        drain(&mut rx_b),
        vec![
            ServerEvent::ShotResult {
                row: 4,
                col: 3,
                hit: true,
                sunk: true,
                piece: Some(vec![c(4, 3)])
            },
            ServerEvent::TurnInfo { your_turn: true },
        ]
    );
    drain(&mut rx_a);

    // B works through every remaining cell of A's fleet. Whenever a hit
    // does not sink, A gets the turn and wastes it on open water.
    let mut a_misses = (6..10).flat_map(|r| (0..10).map(move |col| c(r, col)));
    let remaining: Vec<Piece> = classic_fleet()
        .into_iter()
        .filter(|p| p.cells() != [c(4, 3)])
        .collect();
    let last_piece = remaining.len() - 1;

    for (pi, piece) in remaining.iter().enumerate() {
        for (ci, &cell) in piece.cells().iter().enumerate() {
            let sinks = ci == piece.len() - 1;
            let outcome = handle.shoot(B, cell).await.unwrap();
            assert!(outcome.hit.hit);
            assert_eq!(outcome.hit.sunk_piece.is_some(), sinks);

            if pi == last_piece && sinks {
                assert_eq!(outcome.next_turn, None);
            } else if sinks {
                assert_eq!(outcome.next_turn, Some(B));
            } else {
                assert_eq!(outcome.next_turn, Some(A));
                let miss = a_misses.next().unwrap();
                let reply = handle.shoot(A, miss).await.unwrap();
                assert_eq!(reply.next_turn, Some(B));
            }
        }
    }

    let info = handle.info().await.unwrap();
    assert_eq!(info.phase, MatchPhase::Finished);
    assert_eq!(info.winner, Some(B));

    let over_a = drain(&mut rx_a);
    let over_b = drain(&mut rx_b);
    assert_eq!(
        over_a.last(),
        Some(&ServerEvent::GameOver {
            winner: B,
            you_won: false
        })
    );
    assert_eq!(
        over_b.last(),
        Some(&ServerEvent::GameOver {
            winner: B,
            you_won: true
        })
    );

    // Finished matches stay registered until both players leave.
    assert_eq!(registry.len(), 1);
    assert!(matches!(
        handle.shoot(B, c(9, 0)).await,
        Err(MatchError::MatchNotPlaying(MatchPhase::Finished))
    ));
}

#[tokio::test]
async fn test_out_of_turn_shot_is_rejected_without_events() {
    let mut registry = MatchRegistry::default();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let code = registry.create(A, tx_a).unwrap();
    let handle = registry.join(code.as_str(), B, tx_b).await.unwrap();
    handle.place(A, classic_fleet()).await.unwrap();
    handle.place(B, classic_fleet()).await.unwrap();
    handle.shoot(A, c(9, 9)).await.unwrap();
    drain(&mut rx_a);
    drain(&mut rx_b);

    let result = handle.shoot(A, c(0, 0)).await;

    assert!(matches!(result, Err(MatchError::NotYourTurn(p)) if p == A));
    assert_eq!(handle.info().await.unwrap().turn, Some(B));
    assert!(drain(&mut rx_a).is_empty());
    assert!(drain(&mut rx_b).is_empty());

    // B's board was not touched: the same cell is still fresh for A later.
    handle.shoot(B, c(9, 9)).await.unwrap();
    assert!(handle.shoot(A, c(0, 0)).await.unwrap().hit.hit);
}

#[tokio::test]
async fn test_invalid_placement_is_reported_only_to_sender() {
    let mut registry = MatchRegistry::default();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let code = registry.create(A, tx_a).unwrap();
    let handle = registry.join(code.as_str(), B, tx_b).await.unwrap();
    drain(&mut rx_a);
    drain(&mut rx_b);

    let mut fleet = classic_fleet();
    fleet[9] = Piece::new(vec![c(1, 4)]);
    let result = handle.place(A, fleet).await;

    assert!(matches!(result, Err(MatchError::InvalidPlacement(_))));
    assert!(drain(&mut rx_a).is_empty());
    assert!(drain(&mut rx_b).is_empty());
    assert_eq!(handle.info().await.unwrap().phase, MatchPhase::Placing);
}

// =========================================================================
// Turn order on the bare state machine
// =========================================================================

fn started(rules: RuleSet, a: Vec<Piece>, b: Vec<Piece>) -> Match {
    let mut game = Match::new(LobbyCode::parse("TURNS1").unwrap(), A, rules);
    game.join(B).unwrap();
    game.submit_placement(A, a).unwrap();
    game.submit_placement(B, b).unwrap();
    game
}

#[test]
fn test_scripted_turn_sequence() {
    let rules = RuleSet {
        grid_size: 5,
        fleet: vec![
            FleetRule { length: 2, count: 1 },
            FleetRule { length: 1, count: 2 },
        ],
    };
    let fleet = || {
        vec![
            Piece::new(vec![c(0, 0), c(0, 1)]),
            Piece::new(vec![c(2, 4)]),
            Piece::new(vec![c(4, 0)]),
        ]
    };
    let mut game = started(rules, fleet(), fleet());

    let script = [
        (A, c(3, 3)), // miss            -> B
        (B, c(0, 0)), // hit, no sink    -> A
        (A, c(2, 4)), // sink            -> A
        (A, c(4, 0)), // sink            -> A
        (A, c(0, 0)), // hit, no sink    -> B
        (B, c(0, 1)), // sink            -> B
        (B, c(1, 1)), // miss            -> A
        (A, c(0, 1)), // sink, defeat    -> game over
    ];
    let expected = [
        Some(B),
        Some(A),
        Some(A),
        Some(A),
        Some(B),
        Some(B),
        Some(A),
        None,
    ];

    let turns: Vec<_> = script
        .iter()
        .map(|&(player, cell)| game.attack(player, cell).unwrap().next_turn)
        .collect();

    assert_eq!(turns, expected);
    assert_eq!(game.phase(), MatchPhase::Finished);
    assert_eq!(game.winner(), Some(A));
}

#[test]
fn test_single_piece_fleet_defeated_by_one_hit() {
    let rules = RuleSet {
        grid_size: 3,
        fleet: vec![FleetRule { length: 1, count: 1 }],
    };
    let mut game = started(rules, vec![Piece::new(vec![c(0, 0)])], vec![Piece::new(vec![c(2, 2)])]);

    let miss = game.attack(A, c(0, 0)).unwrap();
    assert!(!miss.hit.hit);
    let win = game.attack(B, c(0, 0)).unwrap();
    assert!(win.hit.defeated);
    assert_eq!(game.winner(), Some(B));
    assert!(game.board(A).unwrap().is_defeated());
    assert!(!game.board(B).unwrap().is_defeated());
}
