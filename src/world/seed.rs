//! The built-in Hollowvale starter world.
//!
//! Eleven rooms around a frontier town square, the NPCs who live in them,
//! and the errands they hand out. Deployments that want their own world load
//! TOML definitions instead; this module is what you get out of the box and
//! what most of the integration tests run against.

use super::types::{
    CurrencyAmount, Direction, FixtureDef, FixtureTrigger, ItemDef, ItemKind, MerchantDef,
    MerchantTemper, NpcArchetype, Objective, OfferSource, OnAttacked, QuestDifficulty, QuestGiver,
    QuestStage, QuestTemplate, RoomDef, WeatherIntensity, WeatherType,
};

pub fn rooms() -> Vec<RoomDef> {
    let mut rooms = Vec::new();

    // Town square - the hub, and the spawn point for new arrivals.
    rooms.push(
        RoomDef::new(
            "town_square",
            "Hollowvale Town Square",
            "Cracked cobblestones ring an old fountain at the heart of Hollowvale. \
             Water still runs over the weathered basin, and a noticeboard stands to \
             one side with parchment stirring in the breeze. A rocky path climbs \
             north toward the watchtower above the valley. The square feels safe \
             and well-worn, a place that has collected more stories than it tells.",
        )
        .outdoor()
        .with_features(&["water", "stone"])
        .with_night(
            "The square lies quiet under the open sky. The fountain sounds louder \
             in the dark, and lamplight from the tavern windows catches the edges \
             of the cobblestones. The noticeboard is a pale shape against the wall.",
        )
        .with_dawn(
            "First light creeps across the cobblestones. The fountain steams \
             faintly in the cool air, and the town is only beginning to stir.",
        )
        .with_exit(Direction::North, "watchtower_path")
        .with_exit(Direction::South, "tavern")
        .with_exit(Direction::East, "market_lane")
        .with_exit(Direction::West, "forest_edge")
        .with_items(&["copper_coin"])
        .with_npcs(&["old_storyteller"])
        .with_fixture(
            FixtureDef::new(
                "fountain",
                "old fountain",
                "The basin is worn smooth by generations of hands and weather. \
                 The water is colder than you expect, and surprisingly clear.",
            )
            .with_aliases(&["basin", "water"])
            .with_hook(FixtureTrigger::OnTouch, "fountain_touch"),
        )
        .with_fixture(
            FixtureDef::new(
                "noticeboard",
                "village noticeboard",
                "A sturdy board layered with old nails and older parchment. \
                 Anyone with work to offer pins a notice here.",
            )
            .with_aliases(&["board", "notices", "notice"])
            .with_hook(FixtureTrigger::OnLook, "noticeboard_postings"),
        )
        .with_ambiance(
            &[
                "The fountain keeps up its steady, soothing trickle.",
                "Footsteps ring off the cobblestones as someone crosses the square.",
                "A breeze sets the noticeboard's parchment fluttering.",
                "The watchtower's shadow inches across the square.",
            ],
            &[
                "The fountain sounds louder in the stillness of the night.",
                "Moonlight glints off the damp cobblestones.",
                "The noticeboard creaks softly in the night breeze.",
            ],
        ),
    );

    // The Rusty Tankard - Mara's tavern, one of the two indoor rooms.
    rooms.push(
        RoomDef::new(
            "tavern",
            "The Rusty Tankard Tavern",
            "Warmth and noise meet you at the door. The air is heavy with stew \
             and wood smoke, rough tables crowd the floor, and a fire snaps in \
             the hearth. Locals and travelers trade news over their tankards. \
             If anything worth knowing happens in Hollowvale, it is repeated here \
             within the hour.",
        )
        .with_night(
            "The tavern has settled into its evening rhythm. Firelight does most \
             of the work now, pooling around the tables that are still occupied \
             and leaving the corners to themselves.",
        )
        .with_exit(Direction::North, "town_square")
        .with_exit(Direction::South, "smithy")
        .with_items(&["wooden_tankard"])
        .with_npcs(&["innkeeper"])
        .with_fixture(
            FixtureDef::new(
                "hearth",
                "stone hearth",
                "A broad stone hearth, blackened with years of use. The fire is \
                 kept burning from first light until the last guest gives up.",
            )
            .with_aliases(&["fire", "fireplace"]),
        )
        .with_ambiance(
            &[
                "The hearth crackles and spits a spray of sparks up the chimney.",
                "Footsteps cross the floorboards overhead.",
                "The smell of cooking drifts out from the kitchen.",
                "A tankard knocks against a table somewhere behind you.",
            ],
            &[
                "Firelight throws long, restless shadows across the walls.",
                "A burst of laughter rises and fades at a corner table.",
                "Tankards clink somewhere in the warm gloom.",
            ],
        ),
    );

    // Stoneforge smithy - indoor, south of the tavern.
    rooms.push(
        RoomDef::new(
            "smithy",
            "Old Stoneforge Smithy",
            "A low building of stone and timber, hung wall to wall with tools and \
             half-finished work. The forge glows with banked embers and the air \
             tastes of coal and hot metal. Everything made of iron in the village \
             started its life on one of these anvils.",
        )
        .with_exit(Direction::North, "tavern")
        .with_items(&["iron_hammer", "lump_of_ore"])
        .with_npcs(&["blacksmith"])
        .with_fixture(
            FixtureDef::new(
                "forge",
                "glowing forge",
                "Banked coals shimmer orange under a skin of ash. Even from a \
                 pace away the heat presses against your face.",
            )
            .with_aliases(&["coals", "embers"])
            .with_hook(FixtureTrigger::OnTouch, "forge_heat"),
        )
        .with_ambiance(
            &[
                "Heat rolls off the forge, making the air above it shimmer.",
                "Hammer blows ring against metal in a steady rhythm.",
                "Sparks leap as fresh coal goes onto the fire.",
            ],
            &[
                "The banked forge still glows faintly in the dark.",
                "Cooling metal ticks softly somewhere among the racks.",
                "The smithy holds the day's heat long after the hammering stops.",
            ],
        ),
    );

    // Market lane - stalls between the square and the old road.
    rooms.push(
        RoomDef::new(
            "market_lane",
            "Market Lane",
            "A narrow lane threads between buildings where stalls crowd in on \
             market days. The stones underfoot are worn, and the smells of spice \
             and fresh bread linger even when the vendors are gone. Today the \
             lane is quiet, holding its breath until the next market morning.",
        )
        .outdoor()
        .with_night(
            "The empty stalls stand in rows of shadow. Canvas covers shift in \
             the breeze, and the lane waits, patient, for morning to bring the \
             sellers back.",
        )
        .with_exit(Direction::West, "town_square")
        .with_exit(Direction::East, "old_road")
        .with_exit(Direction::South, "shrine_of_the_forgotten")
        .with_items(&["fresh_bread", "simple_amulet"])
        .with_npcs(&["herbalist"])
        .with_ambiance(
            &[
                "Voices, footsteps, and the clink of coins carry along the lane.",
                "Canvas awnings flap lazily over the empty stalls.",
                "The mixed scents of spice, flowers, and bread hang in the air.",
            ],
            &[
                "The stalls cast long shadows in the moonlight.",
                "Canvas covers rustle like something breathing in the dark.",
                "The lane is still now, waiting on the morning.",
            ],
        ),
    );

    // Shrine - south of the market, tended by the acolyte.
    rooms.push(
        RoomDef::new(
            "shrine_of_the_forgotten",
            "Shrine of the Forgotten Path",
            "A small stone shrine stands here, its carvings rubbed smooth by \
             centuries of weather and hands. The patterns are older than the \
             village and nobody now reads them, yet the stone seems to hold a \
             faint hum, as if it remembers what it was built to say. The air is \
             quieter here than it has any right to be.",
        )
        .outdoor()
        .with_features(&["stone"])
        .with_night(
            "Moonlight pools in the worn carvings and makes new shapes of them. \
             Whatever the shrine remembers, it remembers it most clearly at night.",
        )
        .with_exit(Direction::North, "market_lane")
        .with_items(&["smooth_rune_stone"])
        .with_npcs(&["quiet_acolyte"])
        .with_fixture(
            FixtureDef::new(
                "carvings",
                "ancient carvings",
                "Lines and spirals cut deep into the stone, softened by age. \
                 Tracing them with your eyes is oddly difficult; they seem to \
                 continue somewhere your sight cannot follow.",
            )
            .with_aliases(&["runes", "shrine", "patterns"])
            .with_hook(FixtureTrigger::OnTouch, "shrine_hum"),
        )
        .with_ambiance(
            &[
                "A sense of calm settles over the shrine like a held breath.",
                "The light falls softer here than anywhere else in the village.",
                "The old symbols catch the light at angles that should not work.",
            ],
            &[
                "The shrine keeps its own kind of darkness, thick and watchful.",
                "Moonlight traces strange paths through the worn carvings.",
                "Something regards you from the shadows, or it is only the stone.",
            ],
        ),
    );

    // Forest edge - west of the square, where the village gives out.
    rooms.push(
        RoomDef::new(
            "forest_edge",
            "Edge of the Whispering Wood",
            "The last cottages of Hollowvale give way to trees here. Village \
             sounds thin out behind you, and the wood ahead crowds close, green \
             and attentive. The path in looks inviting and wrong at the same \
             time, the way a held-out hand can.",
        )
        .outdoor()
        .with_features(&["trees", "grass"])
        .with_night(
            "At night the boundary is sharper. Behind you, lamplight; ahead, a \
             darkness between the trunks that the eye refuses to finish.",
        )
        .with_exit(Direction::East, "town_square")
        .with_exit(Direction::North, "whispering_trees")
        .with_items(&["bundle_of_herbs"])
        .with_npcs(&["nervous_farmer"])
        .with_ambiance(
            &[
                "Leaves rustle in a long, whispery wash of sound.",
                "Birds call from somewhere deeper in the wood.",
                "Tree shadows shift and slide over the grass.",
                "The forest watches the village, and waits.",
            ],
            &[
                "The wood at night is full of movement you never quite see.",
                "Something shifts in the underbrush, then goes still.",
                "The dark between the trees looks deep enough to fall into.",
            ],
        ),
    );

    // Whispering trees - deeper in, the spirit's grove.
    rooms.push(
        RoomDef::new(
            "whispering_trees",
            "The Whispering Trees",
            "The trees lean together overhead and strain the daylight green. \
             The air is still, and you are fairly sure you are not alone in it. \
             The leaves carry on a conversation just below hearing, word-shaped \
             but never words. A good place to listen, if you know how.",
        )
        .outdoor()
        .with_features(&["trees"])
        .with_night(
            "The grove's whispering does not stop at night; it only grows more \
             confident. Shapes move between the trunks at the edge of sight.",
        )
        .with_exit(Direction::South, "forest_edge")
        .with_exit(Direction::East, "ancient_door")
        .with_items(&["strange_leaf"])
        .with_npcs(&["forest_spirit"])
        .with_ambiance(
            &[
                "Wind moves through the branches and the trees murmur to each other.",
                "Dappled light drifts across the forest floor in slow patterns.",
                "Small things go about their business in the leaf litter.",
            ],
            &[
                "The forest wakes into its own night, full of sound and motion.",
                "Shadows pass between the trees. Not all of them belong to branches.",
                "The whispering overhead gains an almost deliberate cadence.",
            ],
        ),
    );

    // The buried door - a dead end, and an unsubtle hook for later.
    rooms.push(
        RoomDef::new(
            "ancient_door",
            "The Buried Door",
            "A stone door stands half-swallowed by the earth, mossy and immense. \
             Runes cover its face and will not hold still in memory; look away \
             and they have rearranged. It is older than the village, older than \
             the road, and it does not open. Its presence is statement enough.",
        )
        .outdoor()
        .with_exit(Direction::West, "whispering_trees")
        .with_fixture(
            FixtureDef::new(
                "door",
                "buried stone door",
                "Up close the runes are crisp, as if cut yesterday, though moss \
                 grows thick on every surrounding surface. There is no handle, \
                 no seam, no hinge. It was not made to be opened from this side.",
            )
            .with_aliases(&["runes", "stone door"])
            .with_hook(FixtureTrigger::OnTouch, "door_chill"),
        ),
    );

    // Watchtower path - the climb north out of the square.
    rooms.push(
        RoomDef::new(
            "watchtower_path",
            "Watchtower Path",
            "A rocky path winds up from the town square between scrub and hardy \
             grass. The wind bites harder with every switchback. The way is \
             well-trodden; the watch goes up and down it in all weather, which \
             is how the stones got this smooth.",
        )
        .outdoor()
        .with_features(&["grass", "stone"])
        .with_night(
            "The path is a pale ribbon in the darkness, climbing toward the \
             black bulk of the tower. The wind is the only traffic at this hour.",
        )
        .with_exit(Direction::South, "town_square")
        .with_exit(Direction::North, "watchtower")
        .with_items(&["loose_stone"])
        .with_npcs(&["patrolling_guard"]),
    );

    // Watchtower - the top of the map, Darin's post.
    rooms.push(
        RoomDef::new(
            "watchtower",
            "Old Watchtower",
            "Wind whips freely across the top of the tower. The stone is \
             crumbling in places but the structure still does its one job: the \
             whole valley lies below like a drawn map, square and lanes and \
             forest and, past all of it, the lands nobody from Hollowvale has \
             named. The view is worth the climb and slightly unsettling.",
        )
        .outdoor()
        .with_night(
            "The valley below is a scatter of lamplit windows in a sea of dark. \
             On a clear night the stars come down to meet the horizon, and the \
             tower feels like the mast of a ship.",
        )
        .with_exit(Direction::South, "watchtower_path")
        .with_items(&["cracked_spyglass"])
        .with_npcs(&["watch_guard"])
        .with_ambiance(
            &[
                "Wind drones past the parapet, making the old tower creak.",
                "The valley spreads out below, sharp in the daylight.",
                "A hawk rides the updraft level with the tower's top.",
            ],
            &[
                "The tower sways a hand's width in the night wind.",
                "The dark below is vast, pricked here and there by lamplight.",
                "Wind moans around the stonework's broken edges.",
            ],
        ),
    );

    // Old road - the eastern limit of the map.
    rooms.push(
        RoomDef::new(
            "old_road",
            "Old Eastward Road",
            "A rutted road runs east out of Hollowvale, worn down by carts and \
             years. It leads toward places that exist here mostly as stories: \
             kingdoms, cities, wars with names. For now it is the edge of the \
             known world, and it feels like one.",
        )
        .outdoor()
        .with_features(&["grass"])
        .with_dusk(
            "The low sun stretches every rut into a ribbon of shadow. The road \
             runs east into a haze the eye cannot unpick, and somewhere in that \
             haze is everywhere else.",
        )
        .with_exit(Direction::West, "market_lane")
        .with_items(&["weathered_signpost"])
        .with_npcs(&["wandering_trader"]),
    );

    rooms
}

pub fn items() -> Vec<ItemDef> {
    vec![
        ItemDef::new("copper_coin", "copper coin", ItemKind::Currency, 0.01)
            .describe("A single copper coin, tarnished and thumb-worn."),
        ItemDef::new("wooden_tankard", "wooden tankard", ItemKind::Container, 0.2)
            .describe("A plain wooden tankard, scarred by use but sound."),
        ItemDef::new("iron_hammer", "iron hammer", ItemKind::Tool, 2.0)
            .describe("A heavy smith's hammer, well balanced and ready for work."),
        ItemDef::new("lump_of_ore", "lump of ore", ItemKind::Misc, 1.5)
            .describe("A rough lump of unrefined ore, heavier than it looks."),
        ItemDef::new("fresh_bread", "fresh bread", ItemKind::Food, 0.5)
            .describe("A loaf still warm enough to smell of the oven."),
        ItemDef::new("simple_amulet", "simple amulet", ItemKind::Artifact, 0.1)
            .describe("A small amulet of plain design, worn smooth by years of handling."),
        ItemDef::new("smooth_rune_stone", "smooth rune stone", ItemKind::Artifact, 0.3)
            .describe("A river-smooth stone cut with old runes. It hums very faintly against the palm.")
            .undroppable(),
        ItemDef::new("bundle_of_herbs", "bundle of herbs", ItemKind::Misc, 0.1)
            .describe("A tied bundle of dried herbs, sharp and green-smelling."),
        ItemDef::new("strange_leaf", "strange leaf", ItemKind::Misc, 0.05)
            .describe("A leaf from no tree you can name. It shimmers when the light moves."),
        ItemDef::new("loose_stone", "loose stone", ItemKind::Misc, 0.3)
            .describe("A fist-sized stone worked loose from the path."),
        ItemDef::new("cracked_spyglass", "cracked spyglass", ItemKind::Tool, 0.4)
            .describe("A brass spyglass with a cracked lens. It still works, mostly."),
        ItemDef::new("weathered_signpost", "weathered signpost", ItemKind::Misc, 5.0)
            .describe("An old signpost, its lettering faded to a rumor of directions."),
        ItemDef::new("bowl_of_stew", "bowl of stew", ItemKind::Food, 0.3)
            .describe("A hearty bowl of stew, thick with herbs and slow-cooked meat."),
        ItemDef::new("tankard_of_ale", "tankard of ale", ItemKind::Food, 0.3)
            .describe("A tankard of ale with a respectable head of froth."),
        ItemDef::new("loaf_of_bread", "loaf of bread", ItemKind::Food, 0.5)
            .describe("A solid loaf, good for sharing or for the road."),
        ItemDef::new("piece_of_bread", "piece of bread", ItemKind::Food, 0.1)
            .describe("A torn piece of bread, soft and fresh."),
        // Quest props. The parcel appears in the world only while the errand
        // that wants it is underway.
        ItemDef::new("lost_package", "small wrapped parcel", ItemKind::Misc, 0.8)
            .describe("A parcel of waxed paper and string, addressed in Mara's tidy hand."),
        ItemDef::new("mara_kitchen_knife", "kitchen knife", ItemKind::Tool, 0.3)
            .describe("A well-kept kitchen knife with a handle worn to the shape of Mara's grip."),
        ItemDef::new("mara_lucky_charm", "Mara's lucky charm", ItemKind::Artifact, 0.05)
            .describe("A little braided charm of copper wire and river glass. Mara swears by it.")
            .quest_item(),
    ]
}

pub fn npcs() -> Vec<NpcArchetype> {
    let mut npcs = Vec::new();

    // Old Storyteller - fixture of the town square.
    npcs.push(
        NpcArchetype::new(
            "old_storyteller",
            "Old Storyteller",
            "An elderly figure with kind eyes, keeper of every tale the village has.",
            "town_square",
        )
        .with_personality("wise, patient, loves stories")
        .with_pronoun("he")
        .with_stats(15, 1, 1, 1, "villagers")
        .with_reaction(
            "nod",
            &[
                "The Old Storyteller returns your nod with a knowing smile.",
                "The Old Storyteller nods slowly, as if agreeing with something unsaid.",
            ],
        )
        .with_reaction(
            "smile",
            &["The Old Storyteller's eyes crinkle as he smiles back."],
        )
        .with_reaction(
            "wave",
            &["The Old Storyteller lifts a weathered hand in greeting."],
        )
        .with_idle_actions(
            "town_square",
            &[
                "The Old Storyteller strokes his beard, far away in some memory.",
                "The Old Storyteller watches the fountain as if reading stories in the water.",
                "The Old Storyteller glances up at the watchtower with a knowing look.",
                "The Old Storyteller traces shapes in the air, rehearsing an old tale.",
                "The Old Storyteller closes his eyes, listening to something only he hears.",
            ],
        )
        .with_idle_actions(
            "default",
            &[
                "The Old Storyteller looks about, taking the measure of the place.",
                "The Old Storyteller settles his robes and makes himself comfortable.",
            ],
        )
        .with_weather_reaction(
            WeatherType::Rain,
            WeatherIntensity::Moderate,
            &[
                "The Old Storyteller draws his hood up and watches the rain with mild approval.",
                "The Old Storyteller shelters under the eaves, unhurried as ever.",
            ],
        )
        .with_weather_reaction(
            WeatherType::Storm,
            WeatherIntensity::Heavy,
            &["The Old Storyteller eyes the storm clouds and mutters about the old signs."],
        )
        .with_weather_reaction(
            WeatherType::Heatwave,
            WeatherIntensity::Moderate,
            &["The Old Storyteller fans himself slowly, unbothered in the way of the very old."],
        )
        .with_on_attacked(OnAttacked {
            reputation_penalty: -15,
            retreat_home: true,
            cooldown_minutes: 60,
            line: "The Old Storyteller regards you with deep sadness. 'Violence has no \
                   place here, child.' He turns away and will not speak with you."
                .to_string(),
        })
        .with_scripted_line(
            "The Old Storyteller looks at you with knowing eyes. 'Welcome, traveler. \
             The tales of this place run deep, deeper than most know. Perhaps you \
             will add a chapter of your own.'",
        ),
    );

    // Mara - innkeeper of the Rusty Tankard, merchant, quest giver.
    npcs.push(
        NpcArchetype::new(
            "innkeeper",
            "Mara",
            "A brisk, capable figure who keeps the Rusty Tankard fed, watered, and orderly.",
            "tavern",
        )
        .with_title("Innkeeper of the Rusty Tankard")
        .with_personality("gruff but kind, keeps a sharp eye on trouble")
        .with_pronoun("she")
        .with_stats(18, 2, 2, 2, "villagers")
        .uses_dialogue()
        .with_reaction(
            "nod",
            &[
                "Mara gives you a short, approving nod.",
                "Mara tilts her head in acknowledgment.",
            ],
        )
        .with_reaction(
            "smile",
            &["Mara's stern expression softens for a moment before she looks away."],
        )
        .with_reaction(
            "wave",
            &["Mara waves back without breaking stride as she wipes down a table."],
        )
        .with_idle_actions(
            "tavern",
            &[
                "Mara squints at you for a second, then goes back to her work.",
                "Mara straightens the signboard by the entrance.",
                "Mara wipes down a bench, humming something under her breath.",
                "Mara checks the fire and nudges a log into place.",
                "Mara rearranges tankards on a shelf until they satisfy her.",
                "Mara sweeps a look around the room, counting trouble and finding none.",
                "Mara wipes her hands on her apron and surveys the tavern.",
            ],
        )
        .with_idle_actions(
            "default",
            &[
                "Mara looks around, visibly itching to be back behind her own bar.",
                "Mara brushes down her apron and takes stock of the place.",
            ],
        )
        .with_merchant(
            MerchantDef::new(MerchantTemper::Fair)
                .sells("bowl_of_stew", 1000, 10)
                .sells("tankard_of_ale", 500, 20)
                .sells("loaf_of_bread", 500, 15)
                .sells("piece_of_bread", 500, 20),
        )
        .with_on_attacked(OnAttacked {
            reputation_penalty: -10,
            retreat_home: true,
            cooldown_minutes: 60,
            line: "Mara looks shocked and disappointed that you would even try that. \
                   She turns her back and refuses to speak with you."
                .to_string(),
        })
        .with_scripted_line(
            "Mara smiles warmly. 'Welcome! We've got hot stew and good ale. Make \
             yourself at home. This is a place where stories get shared.'",
        ),
    );

    // Blacksmith - runs the smithy, charges accordingly.
    npcs.push(
        NpcArchetype::new(
            "blacksmith",
            "Blacksmith",
            "A burly figure with soot-stained hands and an honest opinion of their own work.",
            "smithy",
        )
        .with_personality("practical, straightforward, takes pride in work")
        .with_stats(25, 4, 3, 2, "villagers")
        .with_reaction(
            "nod",
            &["The Blacksmith gives you a quick nod without pausing the work."],
        )
        .with_reaction(
            "wave",
            &["The Blacksmith raises a soot-blackened hand in greeting."],
        )
        .with_idle_actions(
            "smithy",
            &[
                "The Blacksmith turns a piece of metal over, inspecting it from every side.",
                "The Blacksmith wipes sweat away with the back of a forearm.",
                "The Blacksmith reorders the tools on the wall by size.",
                "The Blacksmith stokes the forge and sparks go flying.",
                "The Blacksmith runs a careful thumb along a blade's edge.",
                "The Blacksmith stretches, working the stiffness out of broad shoulders.",
            ],
        )
        .with_idle_actions(
            "default",
            &[
                "The Blacksmith flexes their hands as if missing the weight of a hammer.",
                "The Blacksmith looks about, soot still dark in the creases of their knuckles.",
            ],
        )
        .with_merchant(
            MerchantDef::new(MerchantTemper::Greedy)
                .sells("iron_hammer", 7500, 2)
                .sells("lump_of_ore", 2500, 6),
        )
        .with_scripted_line(
            "The Blacksmith wipes sweat from their brow. 'Good to see you. If you \
             need anything forged or mended, I'm your person. Quality work, fair \
             prices.'",
        ),
    );

    // Herbalist - stall on market lane, gentlest prices in town.
    npcs.push(
        NpcArchetype::new(
            "herbalist",
            "Herbalist",
            "A quiet person who knows every plant in the valley and what it is for.",
            "market_lane",
        )
        .with_personality("quiet, observant, gentle")
        .with_stats(12, 1, 1, 2, "villagers")
        .with_reaction("nod", &["The Herbalist answers with a small, unhurried nod."])
        .with_reaction("smile", &["The Herbalist offers a shy smile in return."])
        .with_idle_actions(
            "market_lane",
            &[
                "The Herbalist checks a bundle of herbs leaf by leaf.",
                "The Herbalist rearranges the plants on the stall until each label faces out.",
                "The Herbalist sniffs a leaf and nods to themself.",
                "The Herbalist touches a flower's petals with evident fondness.",
                "The Herbalist makes a note in a small, much-used notebook.",
            ],
        )
        .with_idle_actions(
            "default",
            &[
                "The Herbalist scans the ground out of habit, hunting for useful growth.",
                "The Herbalist smooths their robes and looks about.",
            ],
        )
        .with_weather_reaction(
            WeatherType::Rain,
            WeatherIntensity::Light,
            &["The Herbalist holds out a palm to the drizzle and looks quietly pleased."],
        )
        .with_weather_reaction(
            WeatherType::Rain,
            WeatherIntensity::Heavy,
            &["The Herbalist hurries to pull oilcloth over the stall's trays."],
        )
        .with_merchant(
            MerchantDef::new(MerchantTemper::Generous)
                .sells("bundle_of_herbs", 750, 8)
                .sells("fresh_bread", 500, 12)
                .sells("simple_amulet", 2500, 2),
        )
        .with_scripted_line(
            "The Herbalist looks up from their plants. 'Hello. The forest provides \
             many useful things, if you know where to look. I can tell you what a \
             herb is good for, if you bring one.'",
        ),
    );

    // Quiet Acolyte - tends the shrine, posts the herb errand.
    npcs.push(
        NpcArchetype::new(
            "quiet_acolyte",
            "Quiet Acolyte",
            "A robed figure who tends the shrine with unhurried devotion.",
            "shrine_of_the_forgotten",
        )
        .with_personality("serene, contemplative, speaks rarely")
        .with_stats(15, 1, 2, 1, "villagers")
        .with_reaction(
            "nod",
            &["The Quiet Acolyte inclines their head a precise, peaceful fraction."],
        )
        .with_reaction(
            "smile",
            &["The Quiet Acolyte's expression eases into a calm smile."],
        )
        .with_idle_actions(
            "shrine_of_the_forgotten",
            &[
                "The Quiet Acolyte kneels at the shrine, lips moving without sound.",
                "The Quiet Acolyte traces the old carvings with reverent fingers.",
                "The Quiet Acolyte lights a stub of candle against the gloom.",
                "The Quiet Acolyte arranges small offerings at the shrine's base.",
                "The Quiet Acolyte breathes slowly, eyes closed, entirely at peace.",
            ],
        )
        .with_idle_actions(
            "default",
            &[
                "The Quiet Acolyte looks about with untroubled eyes.",
                "The Quiet Acolyte folds their hands and settles into stillness.",
            ],
        )
        .with_weather_reaction(
            WeatherType::Snow,
            WeatherIntensity::Light,
            &["The Quiet Acolyte watches the falling snow as if it were an answer."],
        )
        .with_scripted_line(
            "The Quiet Acolyte speaks just above a whisper. 'Peace be with you. \
             This place holds old power and old memory. Some say the forgotten \
             paths still lead somewhere, for those who can walk them.'",
        ),
    );

    // Nervous Farmer - posted unhappily at the forest edge.
    npcs.push(
        NpcArchetype::new(
            "nervous_farmer",
            "Nervous Farmer",
            "A local farmer who would really rather not be standing this close to the trees.",
            "forest_edge",
        )
        .with_personality("anxious, cautious, superstitious")
        .with_stats(14, 2, 1, 2, "villagers")
        .with_reaction(
            "nod",
            &["The Nervous Farmer returns a quick nod, eyes flicking to the treeline."],
        )
        .with_reaction(
            "wave",
            &["The Nervous Farmer half-raises a hand, checking over a shoulder first."],
        )
        .with_idle_actions(
            "forest_edge",
            &[
                "The Nervous Farmer glances at the forest, then quickly away.",
                "The Nervous Farmer shifts from foot to foot, one eye on the trees.",
                "The Nervous Farmer mutters something too low to catch.",
                "The Nervous Farmer checks their tools as if planning a fast exit.",
                "The Nervous Farmer looks over their shoulder, then relaxes a little.",
            ],
        )
        .with_idle_actions(
            "default",
            &["The Nervous Farmer fidgets and keeps glancing at the exits."],
        )
        .with_weather_reaction(
            WeatherType::Storm,
            WeatherIntensity::Heavy,
            &[
                "The Nervous Farmer flinches at the thunder and edges away from the trees.",
                "The Nervous Farmer pulls their coat tight and mutters about omens.",
            ],
        )
        .with_weather_reaction(
            WeatherType::Windy,
            WeatherIntensity::Moderate,
            &["The Nervous Farmer watches the tossing branches with open suspicion."],
        )
        .with_scripted_line(
            "The Nervous Farmer glances toward the wood. 'I don't like being this \
             close to the trees. Strange things happen in there, things that don't \
             make sense. Stay in the village, that's my advice.'",
        ),
    );

    // Forest Spirit - the grove's resident. Attackable, unwisely.
    npcs.push(
        NpcArchetype::new(
            "forest_spirit",
            "Forest Spirit",
            "An ethereal presence that watches from the shadows between the trees.",
            "whispering_trees",
        )
        .with_personality("mysterious, ancient, otherworldly")
        .with_pronoun("it")
        .with_stats(30, 3, 4, 3, "neutral")
        .with_reaction(
            "nod",
            &["The Forest Spirit acknowledges you somehow, though nothing visibly moves."],
        )
        .with_reaction(
            "smile",
            &["Warmth radiates from the Forest Spirit, like sunlight through leaves."],
        )
        .with_idle_actions(
            "whispering_trees",
            &[
                "The Forest Spirit drifts between the trees, barely visible.",
                "The leaves rustle around the Forest Spirit in a pattern close to speech.",
                "The Forest Spirit draws nearer, then fades back into the green shade.",
                "The Forest Spirit glows faintly, its outline refusing to settle.",
                "The Forest Spirit lays an unreal hand against a trunk, gently.",
            ],
        )
        .with_idle_actions(
            "default",
            &["The Forest Spirit drifts at the edge of sight, out of its element."],
        )
        .with_weather_reaction(
            WeatherType::Storm,
            WeatherIntensity::Heavy,
            &["The Forest Spirit brightens with each lightning flash, drinking the storm in."],
        )
        .with_scripted_line(
            "The Forest Spirit's voice comes from everywhere and nowhere. 'You walk \
             between worlds. The trees remember, and they watch. Perhaps you will \
             understand, in time.'",
        ),
    );

    // Patrolling Guard - walks the beat between the path and the square.
    npcs.push(
        NpcArchetype::new(
            "patrolling_guard",
            "Patrolling Guard",
            "A watchful figure keeping the path to the watchtower under a professional eye.",
            "watchtower_path",
        )
        .with_personality("alert, professional, duty-focused")
        .with_stats(20, 3, 2, 2, "guards")
        .with_reaction(
            "nod",
            &["The Patrolling Guard returns a brief, professional nod, eyes still moving."],
        )
        .with_reaction(
            "wave",
            &["The Patrolling Guard answers your wave with a curt nod."],
        )
        .with_idle_actions(
            "watchtower_path",
            &[
                "The Patrolling Guard scans the path ahead, hand resting on their weapon.",
                "The Patrolling Guard checks the horizon for anything out of place.",
                "The Patrolling Guard tugs a strap of their armor back into line.",
                "The Patrolling Guard pauses to rest without ever quite relaxing.",
                "The Patrolling Guard notes something in a small book, then resumes watching.",
            ],
        )
        .with_idle_actions(
            "default",
            &[
                "The Patrolling Guard takes up a position with a clear view of the exits.",
                "The Patrolling Guard checks their equipment with practiced speed.",
            ],
        )
        .with_weather_reaction(
            WeatherType::Rain,
            WeatherIntensity::Heavy,
            &["The Patrolling Guard shakes water off their cloak and keeps walking the beat."],
        )
        .with_weather_reaction(
            WeatherType::Snow,
            WeatherIntensity::Moderate,
            &["The Patrolling Guard stamps warmth back into their boots between strides."],
        )
        .with_route(&["watchtower_path", "town_square"], 120)
        .with_scripted_line(
            "The Patrolling Guard nods. 'Keeping watch is important work. The tower \
             sees far, and someone has to be looking. Stay safe out there.'",
        ),
    );

    // Darin - the watch guard at the top of the tower.
    npcs.push(
        NpcArchetype::new(
            "watch_guard",
            "Darin",
            "A vigilant guard stationed at the watchtower, eyes fixed on the horizon.",
            "watchtower",
        )
        .with_title("Watch Guard")
        .with_personality("dutiful, dry sense of humour, a bit tired")
        .with_pronoun("he")
        .with_stats(22, 3, 3, 2, "guards")
        .with_reaction(
            "nod",
            &[
                "Darin raises an eyebrow, then gives a slight nod back.",
                "Darin answers with a brief, professional nod.",
            ],
        )
        .with_reaction(
            "smile",
            &["Darin cracks a small smile. 'Not much to smile about up here, but I'll take it.'"],
        )
        .with_idle_actions(
            "watchtower",
            &[
                "Darin sweeps the horizon with his spyglass, slow and methodical.",
                "Darin leans on the parapet for a moment's rest.",
                "Darin checks the wind, grimaces, and goes back to watching.",
                "Darin scratches an entry into the watch logbook.",
                "Darin stretches until something in his back gives up with a pop.",
            ],
        )
        .with_idle_actions(
            "default",
            &["Darin stands easy but keeps his back to a wall, out of habit."],
        )
        .with_weather_reaction(
            WeatherType::Windy,
            WeatherIntensity::Heavy,
            &["Darin leans into the gale and mutters that the tower picked a fine place to stand."],
        )
        .with_scripted_line(
            "Darin scans the horizon. 'Welcome to the watchtower. From up here you \
             can see the whole valley. Good reminder that Hollowvale's one small \
             corner of a much bigger world.'",
        ),
    );

    // Wandering Trader - works the old road, prices vary with the mood.
    npcs.push(
        NpcArchetype::new(
            "wandering_trader",
            "Wandering Trader",
            "A traveler with goods from distant lands and a story attached to each of them.",
            "old_road",
        )
        .with_personality("friendly, talkative, always looking for business")
        .with_stats(16, 2, 2, 3, "neutral")
        .with_reaction(
            "nod",
            &["The Wandering Trader nods back with enthusiasm. 'Good to see a friendly face!'"],
        )
        .with_reaction(
            "smile",
            &["The Wandering Trader grins broadly. 'A smile! Now that's proper currency.'"],
        )
        .with_reaction(
            "wave",
            &["The Wandering Trader waves back energetically. 'Greetings, traveler!'"],
        )
        .with_idle_actions(
            "old_road",
            &[
                "The Wandering Trader repacks their goods, checking each item over.",
                "The Wandering Trader peers down the road as if expecting company.",
                "The Wandering Trader counts coins and tucks them somewhere safe.",
                "The Wandering Trader holds a trinket up to the light, appraising it.",
                "The Wandering Trader hums a road song and watches the horizon.",
            ],
        )
        .with_idle_actions(
            "default",
            &["The Wandering Trader sizes the place up for business potential."],
        )
        .with_weather_reaction(
            WeatherType::Heatwave,
            WeatherIntensity::Moderate,
            &["The Wandering Trader fans themself with a hat and offers to sell you one."],
        )
        .with_weather_reaction(
            WeatherType::Rain,
            WeatherIntensity::Moderate,
            &["The Wandering Trader rigs a canvas over the pack with impressive speed."],
        )
        .with_merchant(
            MerchantDef::new(MerchantTemper::Capricious)
                .sells("cracked_spyglass", 12500, 1)
                .sells("wooden_tankard", 500, 4)
                .sells("simple_amulet", 2500, 3),
        )
        .with_route(&["old_road", "market_lane"], 240)
        .with_scripted_line(
            "The Wandering Trader grins. 'Always good to meet a fellow traveler. \
             The road goes on forever, and there's always something new over the \
             next hill.'",
        ),
    );

    npcs
}

pub fn quests() -> Vec<QuestTemplate> {
    let mut quests = Vec::new();

    // Mara's missing parcel. Exclusive errand, offered in conversation.
    quests.push(
        QuestTemplate::new(
            "lost_package",
            "Lost Package",
            "Mara has misplaced a small package in the stock room behind her \
             tavern. She needs someone to find it and bring it back.",
            QuestGiver::Npc {
                npc_id: "innkeeper".to_string(),
            },
            QuestDifficulty::Easy,
        )
        .with_category("Errand")
        .exclusive()
        .with_stage(
            QuestStage::new(
                "talk_to_mara",
                "Talk to Mara and offer to help her find the lost package.",
            )
            .with_objective(Objective::TalkToNpc {
                npc_id: "innkeeper".to_string(),
            })
            .with_objective(Objective::SayKeyword {
                npc_id: "innkeeper".to_string(),
                keywords: vec![
                    "help".to_string(),
                    "what's wrong".to_string(),
                    "can i help".to_string(),
                    "assist".to_string(),
                    "package".to_string(),
                ],
            }),
        )
        .with_stage(
            QuestStage::new(
                "find_package",
                "Find the lost package in the stock room behind the tavern.",
            )
            .with_objective(Objective::ReachRoom {
                room_id: "tavern".to_string(),
            })
            .with_objective(Objective::ObtainItem {
                item_id: "lost_package".to_string(),
            }),
        )
        .with_stage(
            QuestStage::new("return_package", "Return the package to Mara at the tavern.")
                .with_objective(Objective::DeliverItem {
                    item_id: "lost_package".to_string(),
                    npc_id: "innkeeper".to_string(),
                    room_id: Some("tavern".to_string()),
                }),
        )
        .with_reward_currency(CurrencyAmount::from_parts(0, 5, 0))
        .with_reward_reputation("innkeeper", 5, "Helped recover her package")
        .with_reward_item("mara_lucky_charm", true)
        .with_offer(OfferSource::NpcDialogue {
            npc_id: "innkeeper".to_string(),
            keywords: vec![
                "help".to_string(),
                "what's wrong".to_string(),
                "can i help".to_string(),
                "package".to_string(),
                "lost".to_string(),
            ],
            offer_text: "Mara looks up, clearly relieved. 'Oh, thank goodness. I've \
                         lost a small parcel somewhere in the stock room. Could you \
                         help me find it?'"
                .to_string(),
        })
        .with_placement("tavern", "lost_package"),
    );

    // Mara's kitchen knife, gone missing somewhere in town.
    quests.push(
        QuestTemplate::new(
            "mara_lost_item",
            "Mara's Lost Kitchen Knife",
            "Mara the innkeeper has lost her favorite kitchen knife somewhere in \
             town, and she cannot leave the tavern with customers to serve.",
            QuestGiver::Npc {
                npc_id: "innkeeper".to_string(),
            },
            QuestDifficulty::Easy,
        )
        .with_category("Errand")
        .exclusive()
        .max_per_player(1)
        .with_stage(
            QuestStage::new(
                "offer_help",
                "Ask Mara what's wrong and offer to help find her lost item.",
            )
            .with_objective(Objective::TalkToNpc {
                npc_id: "innkeeper".to_string(),
            })
            .with_objective(Objective::SayKeyword {
                npc_id: "innkeeper".to_string(),
                keywords: vec![
                    "help".to_string(),
                    "what's wrong".to_string(),
                    "what have you lost".to_string(),
                    "how can i help".to_string(),
                    "can i help".to_string(),
                    "what happened".to_string(),
                ],
            }),
        )
        .with_stage(
            QuestStage::new("find_knife", "Search around town for Mara's kitchen knife.")
                .with_objective(Objective::ObtainItem {
                    item_id: "mara_kitchen_knife".to_string(),
                }),
        )
        .with_stage(
            QuestStage::new("return_knife", "Return the kitchen knife to Mara at the tavern.")
                .with_objective(Objective::DeliverItem {
                    item_id: "mara_kitchen_knife".to_string(),
                    npc_id: "innkeeper".to_string(),
                    room_id: Some("tavern".to_string()),
                }),
        )
        .with_reward_currency(CurrencyAmount::from_parts(0, 3, 0))
        .with_reward_reputation("innkeeper", 8, "Helped recover her kitchen knife")
        .with_offer(OfferSource::NpcDialogue {
            npc_id: "innkeeper".to_string(),
            keywords: vec![
                "help".to_string(),
                "what's wrong".to_string(),
                "what have you lost".to_string(),
                "how can i help".to_string(),
                "can i help".to_string(),
                "what happened".to_string(),
                "lost".to_string(),
            ],
            offer_text: "Mara looks up with relief. 'Oh, thank you! I've lost my \
                         favorite kitchen knife somewhere in town, and I can't step \
                         away with all these customers. I was out on errands earlier, \
                         so it could be anywhere around the square or the market \
                         lane. I'll make it worth your while!'"
                .to_string(),
        })
        .with_placement("market_lane", "mara_kitchen_knife"),
    );

    // The acolyte's posting on the square noticeboard. Shared, and timed.
    quests.push(
        QuestTemplate::new(
            "herbs_for_the_shrine",
            "Herbs for the Shrine",
            "The acolyte at the Shrine of the Forgotten Path needs fresh herbs \
             for the evening rites. A bundle grows wild near the forest edge.",
            QuestGiver::Noticeboard {
                room_id: "town_square".to_string(),
            },
            QuestDifficulty::Easy,
        )
        .with_category("Gathering")
        .timed(720)
        .max_per_player(3)
        .with_stage(
            QuestStage::new(
                "gather_herbs",
                "Gather a bundle of herbs from the edge of the Whispering Wood.",
            )
            .with_objective(Objective::ObtainItem {
                item_id: "bundle_of_herbs".to_string(),
            }),
        )
        .with_stage(
            QuestStage::new(
                "deliver_herbs",
                "Bring the herbs to the Quiet Acolyte at the shrine.",
            )
            .with_objective(Objective::DeliverItem {
                item_id: "bundle_of_herbs".to_string(),
                npc_id: "quiet_acolyte".to_string(),
                room_id: Some("shrine_of_the_forgotten".to_string()),
            }),
        )
        .with_reward_currency(CurrencyAmount::from_parts(1, 0, 0))
        .with_reward_reputation("quiet_acolyte", 6, "Brought herbs for the rites")
        .with_failure_reputation("quiet_acolyte", -2, "Let the evening rites go wanting")
        .with_offer(OfferSource::Noticeboard {
            room_id: "town_square".to_string(),
        })
        .with_placement("forest_edge", "bundle_of_herbs"),
    );

    quests
}
