//! Betting service: blinds, per-street bookkeeping, round completion and
//! showdown pot splitting.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    entities::{Bet, Chips, Player, SeatIndex},
    functional::HandValue,
};

/// State of the betting on the current street.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BettingRound {
    /// Bet every live player has to match. Zero at the start of each
    /// post-flop street.
    pub current_bet: Chips,
    /// Size of the last full raise on this street, never below the big
    /// blind. Used when the table enforces last-raise minimums.
    pub last_raise: Chips,
    pub is_complete: bool,
}

impl BettingRound {
    #[must_use]
    pub fn new(big_blind: Chips) -> Self {
        Self {
            current_bet: 0,
            last_raise: big_blind,
            is_complete: false,
        }
    }

    pub fn reset(&mut self, big_blind: Chips) {
        *self = Self::new(big_blind);
    }
}

/// Post a forced bet. A stack shorter than the blind posts what it has and
/// is all-in; that is legal, not an error.
pub fn post_blind(player: &mut Player, amount: Chips) -> Chips {
    player.commit(amount)
}

/// Apply a validated bet for `players[idx]`.
///
/// Anything that lifts the bet to match re-opens the action: every other
/// player who can still act has to respond to the new level.
pub fn apply_bet(players: &mut [Player], idx: usize, bet: &Bet, round: &mut BettingRound) {
    let Some(player) = players.get_mut(idx) else {
        warn!("bet for unknown player index {idx}");
        return;
    };
    player.commit(bet.amount);
    player.has_acted = true;
    let new_level = player.bet;

    if new_level > round.current_bet {
        let raise_by = new_level - round.current_bet;
        if raise_by >= round.last_raise {
            round.last_raise = raise_by;
        }
        round.current_bet = new_level;
        for (other_idx, other) in players.iter_mut().enumerate() {
            if other_idx != idx && other.can_act() {
                other.has_acted = false;
            }
        }
    }
    round.is_complete = is_round_complete(players, round);
}

/// Whether the current street's betting is over.
///
/// Complete when at most one player still holds cards, or when every live
/// player is all-in or has acted and matched the bet. A player who has not
/// acted yet, or is behind the bet with chips left, keeps the round open,
/// except when nobody else is left to bet against.
#[must_use]
pub fn is_round_complete(players: &[Player], round: &BettingRound) -> bool {
    let live = players.iter().filter(|p| p.is_live()).count();
    if live <= 1 {
        return true;
    }

    let actors: Vec<&Player> = players.iter().filter(|p| p.can_act()).collect();
    match actors.as_slice() {
        [] => true,
        [only] if only.bet >= round.current_bet => true,
        _ => actors
            .iter()
            .all(|p| p.has_acted && p.bet == round.current_bet),
    }
}

/// Sweep the street's bets into the pot and clear per-street flags.
pub fn collect_bets(players: &mut [Player]) -> Chips {
    let mut collected = 0;
    for player in players.iter_mut() {
        collected += player.bet;
        player.bet = 0;
        player.has_acted = false;
    }
    collected
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SidePot {
    pub amount: Chips,
    pub eligible: BTreeSet<SeatIndex>,
}

/// Split the hand's pot into layers by investment.
///
/// Distinct non-zero investments are thresholds. Each layer holds
/// `(threshold - previous) * contributors` and is contested by the
/// contributors that did not fold. A layer with no live contributor is
/// merged into the layer below it so that the layers always sum to the
/// total invested.
#[must_use]
pub fn compute_side_pots(players: &[Player]) -> Vec<SidePot> {
    let mut thresholds: Vec<Chips> = players
        .iter()
        .map(|p| p.invested)
        .filter(|&invested| invested > 0)
        .collect();
    thresholds.sort_unstable();
    thresholds.dedup();

    let mut pots: Vec<SidePot> = Vec::with_capacity(thresholds.len());
    let mut previous = 0;
    let mut orphaned = 0;
    for threshold in thresholds {
        let contributors = players.iter().filter(|p| p.invested >= threshold);
        let amount = (threshold - previous) * contributors.clone().count() as Chips;
        let eligible: BTreeSet<SeatIndex> = contributors
            .filter(|p| p.is_live())
            .map(|p| p.seat_idx)
            .collect();
        previous = threshold;

        if eligible.is_empty() {
            match pots.last_mut() {
                Some(last) => last.amount += amount,
                None => orphaned += amount,
            }
            continue;
        }
        pots.push(SidePot {
            amount: amount + orphaned,
            eligible,
        });
        orphaned = 0;
    }

    if orphaned > 0 {
        warn!("{orphaned} chips invested with no live player to contest them");
        pots.push(SidePot {
            amount: orphaned,
            eligible: BTreeSet::new(),
        });
    }
    pots
}

/// Result of awarding one side pot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PotAward {
    pub amount: Chips,
    pub winners: Vec<(SeatIndex, Chips)>,
}

/// Award each pot to the best hands among its eligible seats.
///
/// Ties split evenly. Odd chips go one at a time to the tied winners in
/// `payout_order`, which the table sets to clockwise order starting at the
/// first seat after the button.
#[must_use]
pub fn distribute(
    pots: &[SidePot],
    hands: &BTreeMap<SeatIndex, HandValue>,
    payout_order: &[SeatIndex],
) -> Vec<PotAward> {
    let position = |seat: &SeatIndex| {
        payout_order
            .iter()
            .position(|s| s == seat)
            .unwrap_or(usize::MAX)
    };

    pots.iter()
        .map(|pot| {
            let best = pot.eligible.iter().filter_map(|s| hands.get(s)).max();
            let mut winners: Vec<SeatIndex> = pot
                .eligible
                .iter()
                .filter(|s| best.is_some() && hands.get(s) == best)
                .copied()
                .collect();
            winners.sort_by_key(position);

            if winners.is_empty() {
                warn!("pot of {} has no eligible hand", pot.amount);
                return PotAward {
                    amount: pot.amount,
                    winners: Vec::new(),
                };
            }

            let n = winners.len() as Chips;
            let share = pot.amount / n;
            let remainder = (pot.amount % n) as usize;
            PotAward {
                amount: pot.amount,
                winners: winners
                    .into_iter()
                    .enumerate()
                    .map(|(i, seat)| (seat, share + Chips::from(i < remainder)))
                    .collect(),
            }
        })
        .collect()
}

/// Total won per seat across all awards.
#[must_use]
pub fn total_payouts(awards: &[PotAward]) -> BTreeMap<SeatIndex, Chips> {
    let mut totals = BTreeMap::new();
    for (seat, amount) in awards.iter().flat_map(|a| a.winners.iter()) {
        *totals.entry(*seat).or_default() += amount;
    }
    totals
}
