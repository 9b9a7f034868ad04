//! User-facing narration text.
//!
//! All strings shown by the gateway are produced here so that sessions and
//! commands stay free of presentation concerns.

/// Shown when a raid cannot start because one is already live.
pub const RAID_IN_PROGRESS: &str = "Cannot start a raid while one is in progress!";

/// Shown when the death boss defeats the party.
pub const DEATH_DEFEAT: &str = "It wasn't enough...";

/// Death-vote prompt.
pub const DEATH_PROMPT: &str =
    "Turn back now, or face the forces of death again if you dare...";

/// Shown after voting to press on.
pub const DEATH_RETRY: &str = "Death awaits you yet again...";

/// Shown when a rare card drops.
pub const EX_CARD_UNLOCK: &str = "An EX card has been unleashed!";

/// Shown when a user pays the troll's toll.
pub const TOLL_PAID: &str =
    "Uh-oh! You accidentally typed toll! Now you must pay the trolls toll!";

pub fn raid_weakness(weakness: &str) -> String {
    format!("{weakness} is my weakness!")
}

pub fn raid_group_combo(groups: &str, combo: u32) -> String {
    format!("{groups} HAVE COMBINED FOR A {combo}x GROUP COMBO(s)! BONUS DAMAGE UNLOCKED!")
}

pub fn raid_victory(boss: &str, damage: f64) -> String {
    format!("Your party declares victory over {boss}, dealing {damage} total damage!")
}

pub fn raid_defeat(boss: &str, remaining_health: f64) -> String {
    format!(
        "Your party attacks and leaves {boss} at {remaining_health} HP\n\
         {boss} slays your party, leaving no one alive...."
    )
}

pub fn player_hand(player: &str, damage: f64) -> String {
    format!("{player}'s hand, dealing {damage:.2} damage:")
}

pub fn evolution_unlock(first: &str, second: &str) -> String {
    format!("{first} and {second} have evolved!")
}

pub fn curse_applied(user: &str) -> String {
    format!("{user} has been cursed!")
}

pub fn curse_lifted(user: &str) -> String {
    format!("{user}'s curse has been lifted!")
}

pub fn stats_lead(name: &str) -> String {
    format!("{name} has taken the lead!")
}

pub fn stats_tie(name: &str) -> String {
    format!("{name} has tied for the lead!")
}

pub fn stats_milestone(name: &str) -> String {
    format!("{name} IS THE FIRST TO THE 100TH ROLL!!!")
}

pub fn pvp_expired(host: &str) -> String {
    format!("PVP session expired - no one accepted {host}'s challenge!")
}

pub fn pvp_accepted(challenger: &str) -> String {
    format!("{challenger} has accepted the challenge! Battle starting...")
}

pub fn pvp_winner(winner: &str) -> String {
    format!("{winner} wins the PVP battle!")
}
