//! Merchant economy: personality and standing based pricing, purchases and
//! sales against per-merchant stock, the for-sale listing, and the
//! politeness reputation drip.
//!
//! All prices are copper base units. A quote is computed fresh for every
//! transaction; nothing about pricing is cached, so a capricious merchant
//! really does change their mind between quotes.

use rand::Rng;

use super::catalog::WorldCatalog;
use super::errors::WorldError;
use super::store::WorldStore;
use super::textutil;
use super::types::{CurrencyAmount, MerchantTemper, NpcArchetype, PlayerRecord};

/// Reputation a single NPC will ever grant for polite talk alone.
pub const POLITENESS_CAP: i32 = 5;

/// Personality multiplier. Capricious merchants re-roll on every quote.
pub fn temper_multiplier(temper: MerchantTemper, rng: &mut impl Rng) -> f64 {
    match temper {
        MerchantTemper::Greedy => 1.3,
        MerchantTemper::Fair => 1.0,
        MerchantTemper::Generous => 0.85,
        MerchantTemper::Capricious => (rng.gen_range(0.8_f64..=1.3) * 100.0).round() / 100.0,
    }
}

/// Standing-based price modifier, from a steep regular's discount down to
/// a hefty markup for known troublemakers.
pub fn reputation_modifier(reputation: i32) -> f64 {
    if reputation >= 50 {
        0.7
    } else if reputation >= 25 {
        0.85
    } else if reputation >= 10 {
        0.95
    } else if reputation >= 0 {
        1.0
    } else if reputation >= -10 {
        1.1
    } else if reputation >= -25 {
        1.2
    } else {
        1.4
    }
}

/// Announce a standing change, worded by magnitude. Zero deltas stay
/// silent.
pub fn standing_shift_line(npc_name: &str, delta: i32) -> Option<String> {
    let line = match delta {
        0 => return None,
        20.. => format!("Your standing with {} soars.", npc_name),
        10..=19 => format!("Your standing with {} improves greatly.", npc_name),
        5..=9 => format!("Your standing with {} improves.", npc_name),
        1..=4 => format!("Your standing with {} improves a little.", npc_name),
        -4..=-1 => format!("Your standing with {} slips a little.", npc_name),
        -9..=-5 => format!("Your standing with {} suffers.", npc_name),
        -19..=-10 => format!("Your standing with {} suffers badly.", npc_name),
        _ => format!("Your standing with {} collapses.", npc_name),
    };
    Some(line)
}

/// Final unit price: base times personality times standing, rounded to the
/// nearest copper, never below one.
pub fn unit_price(
    base_copper: i64,
    temper: MerchantTemper,
    reputation: i32,
    rng: &mut impl Rng,
) -> i64 {
    let quoted =
        base_copper as f64 * temper_multiplier(temper, rng) * reputation_modifier(reputation);
    (quoted.round() as i64).max(1)
}

/// Resolve free-typed item text against a merchant's price list.
pub fn match_ware<'a>(
    catalog: &WorldCatalog,
    merchant: &'a NpcArchetype,
    query: &str,
) -> Option<&'a str> {
    let prices = &merchant.merchant.as_ref()?.prices;
    let candidates: Vec<(&str, String)> = prices
        .iter()
        .map(|entry| (entry.item_id.as_str(), catalog.item_name(&entry.item_id)))
        .collect();
    textutil::match_named(query, &candidates)
}

/// Buy `quantity` of an item from a merchant NPC. Handles the full
/// transaction: quote, affordability, stock, payment, inventory, and the
/// merchant's hand-over line. Stock is checked and decremented under the
/// NPC's lock so two buyers cannot share the last unit.
pub fn buy(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    npc: &NpcArchetype,
    item_query: &str,
    quantity: u32,
    rng: &mut impl Rng,
) -> Result<String, WorldError> {
    let merchant = match &npc.merchant {
        Some(merchant) => merchant,
        None => return Ok("There's nobody here to serve you!".to_string()),
    };
    let item_id = match match_ware(catalog, npc, item_query) {
        Some(id) => id.to_string(),
        None => return Ok(format!("{} doesn't sell '{}'.", npc.name, item_query)),
    };
    let entry = match merchant.prices.iter().find(|e| e.item_id == item_id) {
        Some(entry) => entry,
        None => return Ok(format!("{} doesn't sell '{}'.", npc.name, item_query)),
    };
    let quantity = quantity.max(1);
    let display = catalog.item_name(&item_id);

    let per_unit = unit_price(entry.price, merchant.temper, player.reputation_with(&npc.id), rng);
    let total = CurrencyAmount::copper(per_unit * quantity as i64);
    let paid = match player.currency.subtract(&total) {
        Some(paid) => paid,
        None => {
            return Ok(format!(
                "You can't afford that. {} wants {} for {} {} (you have {}).",
                npc.name,
                total,
                quantity,
                textutil::pluralize_name(&display, quantity as usize),
                player.currency
            ))
        }
    };

    // Claim the stock before committing the payment, so a failed claim
    // leaves the purse untouched.
    let claimed = store.with_npc(&npc.id, |state| {
        let stock = state.merchant_stock.get(&item_id).copied().unwrap_or(0);
        if stock < quantity {
            return Err(stock);
        }
        state.merchant_stock.insert(item_id.clone(), stock - quantity);
        Ok(())
    })?;
    if let Err(stock) = claimed {
        if stock == 0 {
            return Ok(format!("{} is sold out of {}.", npc.name, display));
        }
        return Ok(format!("{} only has {} of those left.", npc.name, stock));
    }

    player.currency = paid;
    for _ in 0..quantity {
        player.inventory.push(item_id.clone());
    }
    player.push_log(&format!("Bought {} {} from {}", quantity, display, npc.name));

    Ok(format!(
        "You buy {} {} for {}.\n{} hands you the {}.",
        quantity,
        textutil::pluralize_name(&display, quantity as usize),
        total,
        npc.name,
        display
    ))
}

/// Sell an item back to a merchant. Merchants pay half the base price of
/// anything on their own price list, never less than one copper, and take
/// the item into stock. Quest-bound items cannot be sold.
pub fn sell(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &mut PlayerRecord,
    npc: &NpcArchetype,
    item_query: &str,
) -> Result<String, WorldError> {
    let merchant = match &npc.merchant {
        Some(merchant) => merchant,
        None => return Ok("There's nobody here to serve you!".to_string()),
    };

    // The item must come out of the player's own inventory.
    let candidates: Vec<(&str, String)> = player
        .inventory
        .iter()
        .map(|id| (id.as_str(), catalog.item_name(id)))
        .collect();
    let item_id = match textutil::match_named(item_query, &candidates) {
        Some(id) => id.to_string(),
        None => return Ok(format!("You don't have a '{}' to sell.", item_query)),
    };
    let def = catalog.item_or_unknown(&item_id);
    if def.quest_item || !def.droppable {
        return Ok(format!("You can't part with the {}.", def.name));
    }
    let entry = match merchant.prices.iter().find(|e| e.item_id == item_id) {
        Some(entry) => entry,
        None => return Ok(format!("{} isn't interested in the {}.", npc.name, def.name)),
    };

    let payout = CurrencyAmount::copper((entry.price / 2).max(1));
    player.remove_item(&item_id);
    player.currency = player.currency.add(&payout);
    store.with_npc(&npc.id, |state| {
        let stock = state.merchant_stock.get(&item_id).copied().unwrap_or(0);
        state.merchant_stock.insert(item_id.clone(), stock + 1);
    })?;
    player.push_log(&format!("Sold {} to {}", def.name, npc.name));

    Ok(format!("{} gives you {} for the {}.", npc.name, payout, def.name))
}

/// The "Items for sale" listing for one merchant, quoted at the player's
/// current standing, with sold-out wares still shown.
pub fn list_wares(
    catalog: &WorldCatalog,
    store: &WorldStore,
    player: &PlayerRecord,
    npc: &NpcArchetype,
    rng: &mut impl Rng,
) -> Result<String, WorldError> {
    let merchant = match &npc.merchant {
        Some(merchant) => merchant,
        None => return Ok("There's nothing for sale here.".to_string()),
    };
    let state = store.npc_state(&npc.id)?;
    let reputation = player.reputation_with(&npc.id);

    let mut lines = vec!["Items for sale:".to_string()];
    for entry in &merchant.prices {
        let price = CurrencyAmount::copper(unit_price(
            entry.price,
            merchant.temper,
            reputation,
            rng,
        ));
        let display = catalog.item_name(&entry.item_id);
        let stock = state.merchant_stock.get(&entry.item_id).copied().unwrap_or(0);
        if stock > 0 {
            lines.push(format!("  {} - {}", display, price));
        } else {
            lines.push(format!("  {} - {} (sold out)", display, price));
        }
    }
    lines.push(String::new());
    lines.push(format!("{} says: 'Feel free to have a look around.'", npc.name));
    Ok(lines.join("\n"))
}

/// Grant a sliver of reputation for polite language, with anti-farming
/// limits: a hard per-NPC cap, a once-per-three-interactions cooldown, and
/// diminishing returns as standing grows. Returns the points granted.
pub fn politeness_gain(
    player: &mut PlayerRecord,
    npc_id: &str,
    text: &str,
    rng: &mut impl Rng,
) -> i32 {
    const POLITE_WORDS: [&str; 6] =
        ["please", "thanks", "thank you", "thank", "appreciate", "grateful"];
    let lower = text.to_lowercase();
    if !POLITE_WORDS.iter().any(|w| lower.contains(w)) {
        return 0;
    }

    let current = player.reputation_with(npc_id);
    let tracking = player.politeness.entry(npc_id.to_string()).or_default();
    if tracking.total_gained >= POLITENESS_CAP {
        return 0;
    }
    let attempt = tracking.interaction_count % 3 == 0;
    tracking.interaction_count += 1;
    if !attempt {
        return 0;
    }

    let gain = if current >= 20 {
        0
    } else if current >= 5 {
        // Half-point gains become a coin flip for a whole point.
        if rng.gen_bool(0.5) {
            1
        } else {
            0
        }
    } else {
        1
    };
    if gain == 0 {
        return 0;
    }
    tracking.total_gained += gain;
    player.adjust_reputation(npc_id, gain);
    gain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::{MerchantDef, RoomDef};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stall() -> (WorldCatalog, WorldStore, NpcArchetype) {
        let rooms = vec![RoomDef::new("stall", "Stall", "A stall.")];
        let items = vec![
            crate::world::types::ItemDef::new("apple", "apple", crate::world::types::ItemKind::Food, 0.2),
            crate::world::types::ItemDef::new("rope", "coil of rope", crate::world::types::ItemKind::Tool, 2.0),
        ];
        let npcs = vec![NpcArchetype::new("vendor", "Tam", "A vendor.", "stall").with_merchant(
            MerchantDef::new(MerchantTemper::Fair)
                .sells("apple", 3, 10)
                .sells("rope", 100, 2),
        )];
        let catalog =
            WorldCatalog::from_parts("stall", "stall", rooms, items, npcs, Vec::new()).unwrap();
        let store = WorldStore::new(&catalog);
        let npc = catalog.npc("vendor").unwrap().clone();
        (catalog, store, npc)
    }

    #[test]
    fn reputation_ladder_matches_the_posted_bands() {
        assert_eq!(reputation_modifier(50), 0.7);
        assert_eq!(reputation_modifier(25), 0.85);
        assert_eq!(reputation_modifier(10), 0.95);
        assert_eq!(reputation_modifier(0), 1.0);
        assert_eq!(reputation_modifier(-1), 1.1);
        assert_eq!(reputation_modifier(-20), 1.2);
        assert_eq!(reputation_modifier(-60), 1.4);
    }

    #[test]
    fn prices_round_and_never_hit_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        // 10 * 1.3 * 1.0 = 13
        assert_eq!(unit_price(10, MerchantTemper::Greedy, 0, &mut rng), 13);
        // 10 * 0.85 * 0.7 = 5.95 -> 6
        assert_eq!(unit_price(10, MerchantTemper::Generous, 50, &mut rng), 6);
        // 1 * 0.85 * 0.7 = 0.595 -> 1, floored up
        assert_eq!(unit_price(1, MerchantTemper::Generous, 50, &mut rng), 1);
    }

    #[test]
    fn capricious_quotes_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let m = temper_multiplier(MerchantTemper::Capricious, &mut rng);
            assert!((0.8..=1.3).contains(&m), "multiplier {} out of band", m);
        }
    }

    #[test]
    fn standing_announcements_scale_with_the_change() {
        assert_eq!(standing_shift_line("Ansel", 0), None);
        assert_eq!(
            standing_shift_line("Ansel", 2).as_deref(),
            Some("Your standing with Ansel improves a little.")
        );
        assert_eq!(
            standing_shift_line("Ansel", 6).as_deref(),
            Some("Your standing with Ansel improves.")
        );
        assert_eq!(
            standing_shift_line("Ansel", 12).as_deref(),
            Some("Your standing with Ansel improves greatly.")
        );
        assert_eq!(
            standing_shift_line("Ansel", 25).as_deref(),
            Some("Your standing with Ansel soars.")
        );
        assert_eq!(
            standing_shift_line("Ansel", -3).as_deref(),
            Some("Your standing with Ansel slips a little.")
        );
        assert_eq!(
            standing_shift_line("Ansel", -15).as_deref(),
            Some("Your standing with Ansel suffers badly.")
        );
        assert_eq!(
            standing_shift_line("Ansel", -40).as_deref(),
            Some("Your standing with Ansel collapses.")
        );
    }

    #[test]
    fn buying_pays_stocks_down_and_fills_the_pack() {
        let (catalog, store, npc) = stall();
        let mut player = PlayerRecord::new("mira", "stall");
        let mut rng = StdRng::seed_from_u64(3);
        let before = player.currency;

        let response = buy(&catalog, &store, &mut player, &npc, "apple", 3, &mut rng).unwrap();
        assert!(response.contains("You buy 3 apples for 9 copper."), "got {}", response);
        assert!(response.contains("Tam hands you the apple."));
        assert_eq!(player.inventory.iter().filter(|i| *i == "apple").count(), 3);
        assert_eq!(player.currency.base_units, before.base_units - 9);
        assert_eq!(
            store.npc_state("vendor").unwrap().merchant_stock["apple"],
            7
        );
    }

    #[test]
    fn the_till_refuses_what_the_purse_cannot_cover() {
        let (catalog, store, npc) = stall();
        let mut player = PlayerRecord::new("mira", "stall");
        player.currency = CurrencyAmount::copper(5);
        let mut rng = StdRng::seed_from_u64(3);

        let response = buy(&catalog, &store, &mut player, &npc, "rope", 1, &mut rng).unwrap();
        assert!(response.starts_with("You can't afford that."));
        assert!(response.contains("you have 5 copper"));
        assert!(player.inventory.is_empty());
        assert_eq!(store.npc_state("vendor").unwrap().merchant_stock["rope"], 2);
    }

    #[test]
    fn sold_out_wares_stay_sold_out() {
        let (catalog, store, npc) = stall();
        let mut player = PlayerRecord::new("mira", "stall");
        let mut rng = StdRng::seed_from_u64(3);

        buy(&catalog, &store, &mut player, &npc, "rope", 2, &mut rng).unwrap();
        let response = buy(&catalog, &store, &mut player, &npc, "rope", 1, &mut rng).unwrap();
        assert_eq!(response, "Tam is sold out of coil of rope.");

        let listing = list_wares(&catalog, &store, &player, &npc, &mut rng).unwrap();
        assert!(listing.contains("coil of rope - 10 silver (sold out)"));
        assert!(listing.contains("apple - 3 copper"));
        assert!(listing.contains("Feel free to have a look around."));
    }

    #[test]
    fn partial_stock_names_whats_left() {
        let (catalog, store, npc) = stall();
        let mut player = PlayerRecord::new("mira", "stall");
        let mut rng = StdRng::seed_from_u64(3);
        let response = buy(&catalog, &store, &mut player, &npc, "rope", 5, &mut rng).unwrap();
        assert_eq!(response, "Tam only has 2 of those left.");
    }

    #[test]
    fn unfamiliar_goods_are_turned_away() {
        let (catalog, store, npc) = stall();
        let mut player = PlayerRecord::new("mira", "stall");
        let mut rng = StdRng::seed_from_u64(3);
        let response = buy(&catalog, &store, &mut player, &npc, "dragon egg", 1, &mut rng).unwrap();
        assert_eq!(response, "Tam doesn't sell 'dragon egg'.");
    }

    #[test]
    fn selling_returns_half_base_and_restocks() {
        let (catalog, store, npc) = stall();
        let mut player = PlayerRecord::new("mira", "stall");
        player.inventory.push("rope".to_string());
        let before = player.currency;

        let response = sell(&catalog, &store, &mut player, &npc, "rope").unwrap();
        assert!(response.contains("Tam gives you 5 silver for the coil of rope."));
        assert!(player.inventory.is_empty());
        assert_eq!(player.currency.base_units, before.base_units + 50);
        assert_eq!(store.npc_state("vendor").unwrap().merchant_stock["rope"], 3);

        let refusal = sell(&catalog, &store, &mut player, &npc, "rope").unwrap();
        assert_eq!(refusal, "You don't have a 'rope' to sell.");
    }

    #[test]
    fn politeness_drips_slowly_and_caps() {
        let mut player = PlayerRecord::new("mira", "stall");
        let mut rng = StdRng::seed_from_u64(5);

        assert_eq!(politeness_gain(&mut player, "vendor", "nice day", &mut rng), 0);
        assert_eq!(politeness_gain(&mut player, "vendor", "thank you!", &mut rng), 1);
        // Cooldown: the next two polite lines earn nothing.
        assert_eq!(politeness_gain(&mut player, "vendor", "thanks again", &mut rng), 0);
        assert_eq!(politeness_gain(&mut player, "vendor", "please", &mut rng), 0);
        assert_eq!(politeness_gain(&mut player, "vendor", "so grateful", &mut rng), 1);
        assert_eq!(player.reputation_with("vendor"), 2);

        // The cap stops the drip for good.
        player.politeness.get_mut("vendor").unwrap().total_gained = POLITENESS_CAP;
        let mut count = player.politeness["vendor"].interaction_count;
        count -= count % 3; // align to an attempt slot
        player.politeness.get_mut("vendor").unwrap().interaction_count = count;
        assert_eq!(politeness_gain(&mut player, "vendor", "thank you", &mut rng), 0);
    }
}
