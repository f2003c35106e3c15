//! Tests for the tic-tac-toe engine through its public API.

use pretty_assertions::assert_eq;
use tictactoe_engine::{
    Board, GameSession, GameStatus, Move, MoveError, Outcome, Player, SessionState, Square,
    contracts, rules,
};

const WIN_TOP_ROW: [(usize, Player); 5] = [
    (0, Player::X),
    (3, Player::O),
    (1, Player::X),
    (4, Player::O),
    (2, Player::X),
];

const DRAW_GAME: [(usize, Player); 9] = [
    (0, Player::X),
    (1, Player::O),
    (2, Player::X),
    (4, Player::O),
    (3, Player::X),
    (5, Player::O),
    (7, Player::X),
    (6, Player::O),
    (8, Player::X),
];

fn play(moves: &[(usize, Player)]) -> GameSession {
    let mut session = GameSession::new();
    for &(pos, player) in moves {
        session
            .apply_move(pos, player)
            .unwrap_or_else(|e| panic!("move {pos} by {player} rejected: {e}"));
    }
    session
}

#[test]
fn test_turn_parity_before_each_move() {
    let mut session = GameSession::new();
    for (n, &(pos, player)) in DRAW_GAME.iter().enumerate() {
        let expected = if (n + 1) % 2 == 1 { Player::X } else { Player::O };
        assert_eq!(session.current_turn(), expected, "before move {}", n + 1);
        session.apply_move(pos, player).unwrap();
    }
}

/// Checks every reachable position below `session`, returning the number of
/// sessions visited.
fn walk_game_tree(session: &GameSession) -> usize {
    let played = session.moves().len();
    let expected_turn = if (played + 1) % 2 == 1 { Player::X } else { Player::O };
    assert_eq!(session.current_turn(), expected_turn, "before move {}", played + 1);

    let replayed = GameSession::replay(session.moves()).unwrap();
    assert_eq!(replayed.board(), session.board());
    assert_eq!(replayed.status(), session.status());

    match rules::detect(session.board()) {
        Outcome::Win { symbol, line } => {
            assert_eq!(session.status(), GameStatus::Finished);
            assert_eq!(session.winner(), Some(symbol));
            assert_eq!(session.winning_line(), Some(line));
        }
        Outcome::Draw => assert_eq!(session.status(), GameStatus::Draw),
        Outcome::NoOutcome if played == 0 => assert_eq!(session.status(), GameStatus::Waiting),
        Outcome::NoOutcome => assert_eq!(session.status(), GameStatus::InProgress),
    }

    if session.is_over() {
        for pos in 0..9 {
            let mut after = session.clone();
            assert_eq!(
                after.apply_move(pos, session.current_turn()),
                Err(MoveError::GameOver(session.status()))
            );
            assert_eq!(&after, session);
        }
        return 1;
    }

    let mut visited = 1;
    for pos in session.available_positions() {
        let mut next = session.clone();
        next.apply_move(pos, session.current_turn()).unwrap();
        visited += walk_game_tree(&next);
    }
    visited
}

#[test]
fn test_every_legal_game() {
    // 549,946 sessions: the full tic-tac-toe game tree including the empty board.
    assert_eq!(walk_game_tree(&GameSession::new()), 549_946);
}

#[test]
fn test_replay_reproduces_board() {
    for game in [&WIN_TOP_ROW[..], &DRAW_GAME[..], &DRAW_GAME[..4]] {
        let session = play(game);
        let replayed = GameSession::replay(session.moves()).unwrap();
        assert_eq!(replayed.board(), session.board());
        assert_eq!(replayed.status(), session.status());
    }
}

#[test]
fn test_detector_top_row() {
    let x = Square::Occupied(Player::X);
    let o = Square::Occupied(Player::O);
    let e = Square::Empty;
    let board = Board::from_squares([x, x, x, o, o, e, e, e, e]);
    assert_eq!(
        rules::detect(&board),
        Outcome::Win {
            symbol: Player::X,
            line: [0, 1, 2]
        }
    );
}

#[test]
fn test_detector_full_board_draw() {
    let session = play(&DRAW_GAME);
    assert!(session.board().is_full());
    assert_eq!(rules::detect(session.board()), Outcome::Draw);
}

#[test]
fn test_occupied_cell_leaves_board_unchanged() {
    let mut session = play(&WIN_TOP_ROW[..2]);
    let board = session.board().clone();
    assert_eq!(
        session.apply_move(3, Player::X),
        Err(MoveError::CellOccupied(3))
    );
    assert_eq!(session.board(), &board);
}

#[test]
fn test_wrong_turn_leaves_board_unchanged() {
    let mut session = play(&WIN_TOP_ROW[..2]);
    let board = session.board().clone();
    assert!(matches!(
        session.apply_move(8, Player::O),
        Err(MoveError::WrongTurn {
            expected: Player::X,
            got: Player::O
        })
    ));
    assert_eq!(session.board(), &board);
}

#[test]
fn test_moves_after_terminal_state_rejected() {
    let mut won = play(&WIN_TOP_ROW);
    for pos in [5, 0, 42] {
        for player in [Player::X, Player::O] {
            assert_eq!(
                won.apply_move(pos, player),
                Err(MoveError::GameOver(GameStatus::Finished))
            );
        }
    }

    let mut drawn = play(&DRAW_GAME);
    assert_eq!(
        drawn.apply_move(0, Player::O),
        Err(MoveError::GameOver(GameStatus::Draw))
    );
}

#[test]
fn test_reset_from_any_state() {
    for game in [&WIN_TOP_ROW[..], &DRAW_GAME[..], &DRAW_GAME[..3], &[][..]] {
        let mut session = play(game);
        session.reset();
        assert!(session.board().squares().iter().all(|s| *s == Square::Empty));
        assert_eq!(session.status(), GameStatus::Waiting);
        assert_eq!(session.current_turn(), Player::X);
        assert!(session.moves().is_empty());
        assert_eq!(session.winner(), None);
    }
}

#[test]
fn test_win_scenario() {
    let session = play(&WIN_TOP_ROW);
    assert_eq!(session.status(), GameStatus::Finished);
    assert_eq!(session.winner(), Some(Player::X));
    assert_eq!(session.winning_line(), Some([0, 1, 2]));
    assert!(session.finished_at().is_some());
}

#[test]
fn test_draw_scenario() {
    let session = play(&DRAW_GAME);
    assert_eq!(session.status(), GameStatus::Draw);
    assert_eq!(session.winner(), None);
    assert!(session.finished_at().is_some());
    assert_eq!(
        session.moves().last(),
        Some(&Move::new(8, Player::X, 9))
    );
}

#[test]
fn test_validator_is_pure() {
    let board = Board::new();
    let before = board.clone();
    let _ = contracts::validate(&board, 4, Player::X, Player::X, GameStatus::Waiting);
    let _ = contracts::validate(&board, 40, Player::X, Player::X, GameStatus::Waiting);
    assert_eq!(board, before);
}

#[test]
fn test_state_round_trip_through_json() {
    let session = play(&DRAW_GAME[..6]);
    let json = SessionState::from(&session).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["status"], "in_progress");
    assert_eq!(value["current_turn"], "X");
    assert_eq!(value["moves"].as_array().map(Vec::len), Some(6));

    let restored = SessionState::session_from_json(&json).unwrap();
    assert_eq!(restored, session);
}
