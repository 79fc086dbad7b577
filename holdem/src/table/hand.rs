//! The table's owned state and the synchronous hand lifecycle.
//!
//! [`Table`] knows nothing about time, the ledger or notifications. The actor
//! drives it one step at a time and turns the returned records into facts
//! and events.

use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashSet, VecDeque};

use super::{
    config::TableConfig,
    errors::{TableError, TableResult},
    messages::{PlayerSnapshot, TableSnapshot},
};
use crate::{
    game::{
        betting::{self, BettingRound, PotAward},
        constants::{BOARD_CARDS, HOLE_CARDS},
        entities::{
            Action, ActionChoices, Card, Chips, Deck, PlayPositions, Player, SeatIndex, Username,
        },
        functional::{HandValue, eval},
        state_machine::{StateMachine, StateMachineError, TablePhase},
        validation::{self, ActionError, Validated},
    },
    wallet::TableId,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Seated(SeatIndex),
    /// A hand is running; seated before the next one.
    Waitlisted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Gone now, with the chips to cash out.
    Removed { chips: Chips },
    /// Folded out of the running hand; cashed out once it ends.
    Pending,
}

/// What the start of a hand looked like.
#[derive(Clone, Debug, PartialEq)]
pub struct HandStart {
    pub hand_number: u64,
    pub button: Username,
    pub small_blind: (Username, Chips),
    pub big_blind: (Username, Chips),
    pub hole_cards: Vec<(Username, Vec<Card>)>,
}

/// An accepted action, after normalisation (a short call is an all-in).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionRecord {
    pub username: Username,
    pub action: Action,
    pub amount: Chips,
    pub pot: Chips,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreetOutcome {
    Dealt { phase: TablePhase, board: Vec<Card> },
    Showdown,
    /// Everyone but one folded.
    Uncontested,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reveal {
    pub username: Username,
    pub cards: Vec<Card>,
    pub value: HandValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandResult {
    pub hand_number: u64,
    pub uncontested: bool,
    pub board: Vec<Card>,
    pub reveals: Vec<Reveal>,
    pub awards: Vec<PotAward>,
    /// Total won per player, in payout order.
    pub winners: Vec<(Username, Chips)>,
}

#[derive(Debug)]
pub struct Table {
    id: TableId,
    config: TableConfig,
    phase: StateMachine<TablePhase>,
    /// Seated players ordered by seat.
    players: Vec<Player>,
    waitlist: VecDeque<(Username, Chips)>,
    /// Players who left during the running hand.
    departed: HashSet<Username>,
    deck: Deck,
    next_deck: Option<Deck>,
    board: Vec<Card>,
    /// Chips collected from finished streets.
    pot: Chips,
    round: BettingRound,
    positions: PlayPositions,
    button_seat: Option<SeatIndex>,
    hand_count: u64,
}

impl Table {
    #[must_use]
    pub fn new(config: TableConfig) -> Self {
        let big_blind = config.big_blind;
        Self {
            id: config.name.clone(),
            players: Vec::with_capacity(config.max_players),
            waitlist: VecDeque::with_capacity(config.max_players),
            config,
            phase: TablePhase::machine(),
            departed: HashSet::new(),
            deck: Deck::default(),
            next_deck: None,
            board: Vec::with_capacity(BOARD_CARDS),
            pot: 0,
            round: BettingRound::new(big_blind),
            positions: PlayPositions::default(),
            button_seat: None,
            hand_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn phase(&self) -> TablePhase {
        *self.phase.current()
    }

    pub fn in_hand(&self) -> bool {
        self.phase().in_hand()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, username: &Username) -> Option<&Player> {
        self.players.iter().find(|p| &p.name == username)
    }

    pub fn usernames(&self) -> Vec<Username> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn hand_count(&self) -> u64 {
        self.hand_count
    }

    /// Chips in the middle, bets of the current street included.
    pub fn pot(&self) -> Chips {
        self.pot + self.players.iter().map(|p| p.bet).sum::<Chips>()
    }

    /// Chips that belong to the table: stacks, bets and the pot.
    pub fn chips_in_play(&self) -> Chips {
        self.pot() + self.players.iter().map(|p| p.stack).sum::<Chips>()
    }

    pub fn is_seated(&self, username: &Username) -> bool {
        self.index_of(username).is_some()
    }

    pub fn is_waiting(&self, username: &Username) -> bool {
        self.waitlist.iter().any(|(name, _)| name == username)
    }

    /// Deck for the next hand instead of a fresh shuffle.
    pub fn set_next_deck(&mut self, deck: Deck) {
        self.next_deck = Some(deck);
    }

    fn index_of(&self, username: &Username) -> Option<usize> {
        self.players.iter().position(|p| &p.name == username)
    }

    fn transition(&mut self, to: TablePhase) -> TableResult<()> {
        if let Err(e) = self.phase.transition(to) {
            error!("{}: {e}", self.id);
            debug_assert!(false, "{}: {e}", self.id);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn check_join(&self, username: &Username, buy_in: Chips) -> TableResult<()> {
        let (min, max) = (
            self.config.min_buy_in_chips(),
            self.config.max_buy_in_chips(),
        );
        if !(min..=max).contains(&buy_in) {
            return Err(TableError::BuyInOutOfRange { min, max });
        }
        if self.is_seated(username) || self.is_waiting(username) {
            return Err(TableError::AlreadySeated(username.clone()));
        }
        let staying = self.players.len() - self.departed.len();
        if staying + self.waitlist.len() >= self.config.max_players {
            return Err(TableError::TableFull);
        }
        Ok(())
    }

    /// Seat `username` now, or queue them if a hand is running. The buy-in
    /// must already have been taken from the ledger.
    pub fn join(&mut self, username: Username, buy_in: Chips) -> TableResult<JoinOutcome> {
        self.check_join(&username, buy_in)?;
        if self.in_hand() {
            info!("{}: {username} waitlisted with {buy_in}", self.id);
            self.waitlist.push_back((username, buy_in));
            return Ok(JoinOutcome::Waitlisted);
        }
        let seat = self.seat(username, buy_in).ok_or(TableError::TableFull)?;
        self.settle_phase();
        Ok(JoinOutcome::Seated(seat))
    }

    fn open_seat(&self) -> Option<SeatIndex> {
        (0..self.config.max_players).find(|seat| self.players.iter().all(|p| p.seat_idx != *seat))
    }

    fn seat(&mut self, username: Username, stack: Chips) -> Option<SeatIndex> {
        let seat = self.open_seat()?;
        info!("{}: {username} takes seat {seat} with {stack}", self.id);
        let idx = self.players.partition_point(|p| p.seat_idx < seat);
        self.players.insert(idx, Player::new(username, stack, seat));
        Some(seat)
    }

    /// Move waiting players into open seats. Only between hands.
    pub fn seat_waiting(&mut self) -> Vec<(Username, SeatIndex)> {
        let mut seated = Vec::new();
        if self.in_hand() {
            return seated;
        }
        while self.open_seat().is_some() {
            let Some((username, stack)) = self.waitlist.pop_front() else {
                break;
            };
            if let Some(seat) = self.seat(username.clone(), stack) {
                seated.push((username, seat));
            }
        }
        self.settle_phase();
        seated
    }

    pub fn leave(&mut self, username: &Username) -> TableResult<LeaveOutcome> {
        if let Some(pos) = self.waitlist.iter().position(|(name, _)| name == username) {
            let (_, chips) = self.waitlist.remove(pos).ok_or(TableError::NotSeated)?;
            return Ok(LeaveOutcome::Removed { chips });
        }

        let idx = self.index_of(username).ok_or(TableError::NotSeated)?;
        if self.in_hand() {
            self.departed.insert(username.clone());
            self.force_fold(username);
            info!("{}: {username} leaves after the hand", self.id);
            return Ok(LeaveOutcome::Pending);
        }

        let player = self.players.remove(idx);
        info!("{}: {username} left with {}", self.id, player.stack);
        self.settle_phase();
        Ok(LeaveOutcome::Removed {
            chips: player.stack,
        })
    }

    /// Remove players who left during the last hand. Only between hands.
    pub fn take_departed(&mut self) -> Vec<Player> {
        if self.in_hand() || self.departed.is_empty() {
            return Vec::new();
        }
        let departed = std::mem::take(&mut self.departed);
        let (gone, staying): (Vec<Player>, Vec<Player>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|p| departed.contains(&p.name));
        self.players = staying;
        self.settle_phase();
        gone
    }

    /// Remove players who can't cover the big blind. Only between hands.
    pub fn boot_broke(&mut self) -> Vec<Player> {
        if self.in_hand() {
            return Vec::new();
        }
        let big_blind = self.config.big_blind;
        let (broke, staying): (Vec<Player>, Vec<Player>) = std::mem::take(&mut self.players)
            .into_iter()
            .partition(|p| p.stack < big_blind);
        self.players = staying;
        for player in &broke {
            info!("{}: {} eliminated with {}", self.id, player.name, player.stack);
        }
        self.settle_phase();
        broke
    }

    /// Everyone remaining leaves the table; returns their chips.
    pub fn clear(&mut self) -> Vec<(Username, Chips)> {
        let mut cleared: Vec<(Username, Chips)> = self
            .players
            .drain(..)
            .map(|p| (p.name, p.stack))
            .collect();
        cleared.extend(self.waitlist.drain(..));
        self.departed.clear();
        self.settle_phase();
        cleared
    }

    pub fn can_start_hand(&self) -> bool {
        !self.in_hand() && self.players.len() >= self.config.min_players
    }

    /// Outside a hand, sit in `BetweenHands` when enough players are seated
    /// and in `WaitingForPlayers` otherwise.
    fn settle_phase(&mut self) {
        if self.in_hand() {
            return;
        }
        let target = if self.players.len() >= self.config.min_players {
            TablePhase::BetweenHands
        } else {
            TablePhase::WaitingForPlayers
        };
        let settled = self.transition(target);
        debug_assert!(settled.is_ok(), "idle phases reach each other");
    }

    fn rotate_button(&mut self) -> usize {
        let idx = self
            .button_seat
            .and_then(|prev| self.players.iter().position(|p| p.seat_idx > prev))
            .unwrap_or(0);
        self.button_seat = Some(self.players[idx].seat_idx);
        idx
    }

    /// Reset per-hand state, move the button, post blinds and deal.
    pub fn start_hand(&mut self) -> TableResult<HandStart> {
        let n = self.players.len();
        if self.in_hand() || n < self.config.min_players.max(2) {
            return Err(TableError::NotEnoughPlayers {
                required: self.config.min_players,
            });
        }
        if self.phase() == TablePhase::WaitingForPlayers {
            self.transition(TablePhase::BetweenHands)?;
        }
        self.transition(TablePhase::PreFlop)?;
        self.hand_count += 1;

        for player in &mut self.players {
            player.reset();
        }
        self.board.clear();
        self.pot = 0;
        self.round.reset(self.config.big_blind);

        let button_idx = self.rotate_button();
        let (small_blind_idx, big_blind_idx) = if n == 2 {
            (button_idx, (button_idx + 1) % n)
        } else {
            ((button_idx + 1) % n, (button_idx + 2) % n)
        };
        self.players[button_idx].is_dealer = true;
        self.players[small_blind_idx].is_small_blind = true;
        self.players[big_blind_idx].is_big_blind = true;

        let small = betting::post_blind(&mut self.players[small_blind_idx], self.config.small_blind);
        let big = betting::post_blind(&mut self.players[big_blind_idx], self.config.big_blind);
        self.round.current_bet = self.config.big_blind;

        self.deck = self.next_deck.take().unwrap_or_else(Deck::new_shuffled);
        for _ in 0..HOLE_CARDS {
            for k in 1..=n {
                let card = self.deck.draw_one()?;
                self.players[(button_idx + k) % n].cards.push(card);
            }
        }

        let starting_action_idx = (big_blind_idx + 1) % n;
        self.positions = PlayPositions {
            button_idx,
            small_blind_idx,
            big_blind_idx,
            starting_action_idx,
            next_action_idx: None,
        };
        self.positions.next_action_idx = self.first_to_act(starting_action_idx);

        info!(
            "{}: hand #{} started, {} on the button",
            self.id, self.hand_count, self.players[button_idx].name
        );
        Ok(HandStart {
            hand_number: self.hand_count,
            button: self.players[button_idx].name.clone(),
            small_blind: (self.players[small_blind_idx].name.clone(), small),
            big_blind: (self.players[big_blind_idx].name.clone(), big),
            hole_cards: self
                .players
                .iter()
                .map(|p| (p.name.clone(), p.cards.clone()))
                .collect(),
        })
    }

    fn needs_action(&self, idx: usize) -> bool {
        let player = &self.players[idx];
        player.can_act() && (!player.has_acted || player.bet < self.round.current_bet)
    }

    /// First player at or after `start` who still owes a decision.
    fn first_to_act(&self, start: usize) -> Option<usize> {
        if betting::is_round_complete(&self.players, &self.round) {
            return None;
        }
        let n = self.players.len();
        (0..n)
            .map(|k| (start + k) % n)
            .find(|&idx| self.needs_action(idx))
    }

    pub fn next_to_act(&self) -> Option<&Player> {
        self.positions
            .next_action_idx
            .and_then(|idx| self.players.get(idx))
    }

    pub fn action_choices(&self, username: &Username) -> ActionChoices {
        match self.player(username) {
            Some(player) if self.phase().is_betting() => validation::action_choices(
                player,
                &self.round,
                self.config.min_raise,
                self.config.big_blind,
            ),
            _ => ActionChoices::default(),
        }
    }

    /// Why `username` can't act right now.
    pub fn turn_error(&self, username: &Username) -> ActionError {
        if !self.is_seated(username) {
            ActionError::NotSeated
        } else if !self.phase().is_betting() {
            ActionError::ActionNotAvailable {
                phase: self.phase(),
            }
        } else {
            ActionError::NotYourTurn
        }
    }

    /// Apply `action` for the player whose turn it is.
    pub fn act(&mut self, username: &Username, action: Action) -> Result<ActionRecord, ActionError> {
        let idx = self.index_of(username).ok_or(ActionError::NotSeated)?;
        let phase = self.phase();
        if !phase.is_betting() {
            return Err(ActionError::ActionNotAvailable { phase });
        }
        if self.positions.next_action_idx != Some(idx) {
            return Err(ActionError::NotYourTurn);
        }

        let validated = validation::validate(
            &self.players[idx],
            action,
            &self.round,
            self.config.min_raise,
            self.config.big_blind,
        )?;
        let (action, amount) = match validated {
            Validated::Fold => {
                let player = &mut self.players[idx];
                player.folded = true;
                player.has_acted = true;
                (Action::Fold, 0)
            }
            Validated::Check => {
                self.players[idx].has_acted = true;
                (Action::Check, 0)
            }
            Validated::Bet(bet) => {
                betting::apply_bet(&mut self.players, idx, &bet, &mut self.round);
                (Action::from(bet), bet.amount)
            }
        };
        self.players[idx].last_action = Some(action);
        self.advance_turn(idx);

        debug!("{}: {username} {action}", self.id);
        Ok(ActionRecord {
            username: username.clone(),
            action,
            amount,
            pot: self.pot(),
        })
    }

    /// Fold `username` out of turn, e.g. when they leave mid-hand.
    pub fn force_fold(&mut self, username: &Username) -> bool {
        let Some(idx) = self.index_of(username) else {
            return false;
        };
        if !self.in_hand() || !self.players[idx].is_live() {
            return false;
        }
        let player = &mut self.players[idx];
        player.folded = true;
        player.last_action = Some(Action::Fold);
        if self.phase().is_betting() {
            let from = match self.positions.next_action_idx {
                Some(next) if next != idx => next,
                _ => idx + 1,
            };
            self.advance_turn_from(from);
        }
        true
    }

    fn advance_turn(&mut self, acted_idx: usize) {
        self.advance_turn_from(acted_idx + 1);
    }

    fn advance_turn_from(&mut self, start: usize) {
        self.round.is_complete = betting::is_round_complete(&self.players, &self.round);
        self.positions.next_action_idx = if self.round.is_complete {
            None
        } else {
            self.first_to_act(start % self.players.len())
        };
    }

    pub fn is_betting_over(&self) -> bool {
        self.positions.next_action_idx.is_none()
    }

    pub fn live_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_live()).count()
    }

    /// Close the street and deal the next one, or move to showdown.
    pub fn advance_street(&mut self) -> TableResult<StreetOutcome> {
        self.pot += betting::collect_bets(&mut self.players);
        self.positions.next_action_idx = None;

        if self.live_count() <= 1 {
            self.transition(TablePhase::Showdown)?;
            return Ok(StreetOutcome::Uncontested);
        }

        let phase = self.phase();
        let next = phase
            .next_street()
            .ok_or(TableError::IllegalTransition(StateMachineError::Illegal {
                from: phase,
                to: TablePhase::Showdown,
            }))?;
        self.transition(next)?;
        if next == TablePhase::Showdown {
            return Ok(StreetOutcome::Showdown);
        }

        let count = if next == TablePhase::Flop { 3 } else { 1 };
        let cards = self.deck.draw_many(count)?;
        self.board.extend(cards);
        self.round.reset(self.config.big_blind);

        let can_act = self.players.iter().filter(|p| p.can_act()).count();
        self.positions.next_action_idx = if can_act >= 2 {
            self.first_to_act((self.positions.button_idx + 1) % self.players.len())
        } else {
            None
        };
        debug!("{}: {next} {:?}", self.id, self.board);
        Ok(StreetOutcome::Dealt {
            phase: next,
            board: self.board.clone(),
        })
    }

    /// Seats in odd-chip order: clockwise from the first seat after the
    /// button.
    fn payout_order(&self) -> Vec<SeatIndex> {
        let n = self.players.len();
        (1..=n)
            .map(|k| self.players[(self.positions.button_idx + k) % n].seat_idx)
            .collect()
    }

    /// Award the pot and close the hand.
    pub fn finish_hand(&mut self) -> TableResult<HandResult> {
        self.pot += betting::collect_bets(&mut self.players);
        if self.phase() != TablePhase::Showdown {
            self.transition(TablePhase::Showdown)?;
        }

        let live: Vec<usize> = (0..self.players.len())
            .filter(|&idx| self.players[idx].is_live())
            .collect();
        let uncontested = live.len() == 1;

        let mut reveals = Vec::new();
        let awards = if let [winner] = live.as_slice() {
            let seat = self.players[*winner].seat_idx;
            vec![PotAward {
                amount: self.pot,
                winners: vec![(seat, self.pot)],
            }]
        } else {
            let mut hands = BTreeMap::new();
            for &idx in &live {
                let player = &self.players[idx];
                let mut cards = player.cards.clone();
                cards.extend_from_slice(&self.board);
                let value = eval(&cards);
                hands.insert(player.seat_idx, value.clone());
                reveals.push(Reveal {
                    username: player.name.clone(),
                    cards: player.cards.clone(),
                    value,
                });
            }
            let pots = betting::compute_side_pots(&self.players);
            betting::distribute(&pots, &hands, &self.payout_order())
        };

        let totals = betting::total_payouts(&awards);
        let paid: Chips = totals.values().sum();
        if paid != self.pot {
            error!("{}: pot of {} paid out {paid}", self.id, self.pot);
        }
        debug_assert_eq!(paid, self.pot);

        let mut winners = Vec::with_capacity(totals.len());
        for seat in self.payout_order() {
            let Some(&amount) = totals.get(&seat) else {
                continue;
            };
            if let Some(player) = self.players.iter_mut().find(|p| p.seat_idx == seat) {
                player.stack += amount;
                winners.push((player.name.clone(), amount));
            }
        }
        for (name, amount) in &winners {
            info!("{}: {name} wins {amount}", self.id);
        }
        if winners.is_empty() {
            warn!("{}: hand #{} had no winner", self.id, self.hand_count);
        }

        self.pot = 0;
        for player in &mut self.players {
            player.invested = 0;
        }
        self.transition(TablePhase::BetweenHands)?;
        self.settle_phase();

        Ok(HandResult {
            hand_number: self.hand_count,
            uncontested,
            board: self.board.clone(),
            reveals,
            awards,
            winners,
        })
    }

    /// Abandon the running hand and give every player back what they put
    /// in. Returns the refunds.
    pub fn abort_hand(&mut self) -> Vec<(Username, Chips)> {
        let mut refunds = Vec::new();
        for player in &mut self.players {
            if player.invested > 0 {
                player.stack += player.invested;
                refunds.push((player.name.clone(), player.invested));
            }
            player.bet = 0;
            player.invested = 0;
            player.cards.clear();
        }
        self.pot = 0;
        self.board.clear();
        self.positions.next_action_idx = None;

        if self.phase.transition(TablePhase::BetweenHands).is_err() {
            error!("{}: resetting phase from {}", self.id, self.phase());
            self.phase = StateMachine::new(TablePhase::BetweenHands, TablePhase::can_transition);
        }
        self.settle_phase();
        warn!("{}: hand #{} aborted", self.id, self.hand_count);
        refunds
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            table_name: self.config.name.clone(),
            phase: self.phase(),
            hand_number: self.hand_count,
            blinds: self.config.blinds(),
            max_players: self.config.max_players,
            pot: self.pot(),
            board: self.board.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    username: p.name.clone(),
                    seat: p.seat_idx,
                    stack: p.stack,
                    bet: p.bet,
                    folded: p.folded,
                    all_in: p.all_in,
                    is_dealer: p.is_dealer,
                    last_action: p.last_action,
                })
                .collect(),
            waitlist: self.waitlist.iter().map(|(name, _)| name.clone()).collect(),
            next_to_act: self.next_to_act().map(|p| p.name.clone()),
        }
    }
}
