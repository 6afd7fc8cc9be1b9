//! Rules relating the faces of a multi-faced card.

use super::types::{Card, Layout, Side};

/// Name a lookup must be re-resolved with, if `side` never stands for the
/// whole card under `layout`.
///
/// Flip, adventure, split and aftermath cards resolve to their side "a".
/// Meld sides are independent cards and never redirect.
pub fn canonical_redirect<'a>(
    layout: Layout,
    side: Option<Side>,
    names: &'a [String],
) -> Option<&'a str> {
    if layout.redirects_side_b() && side == Some(Side::B) {
        names.first().map(String::as_str)
    } else {
        None
    }
}

/// The faces printed together with `card`, in side order.
///
/// A meld card shows itself and the melded result, not its partner.
pub fn printed_faces(card: &Card) -> Vec<&Card> {
    let mut faces: Vec<&Card> = std::iter::once(card).chain(card.other_faces.iter()).collect();
    if card.side().is_some() {
        faces.sort_by_key(|face| face.side());
    }
    if card.layout == Layout::Meld {
        faces.retain(|face| face.side() == card.side() || face.side() == Some(Side::C));
    }
    faces
}

/// All printed face names joined with " // ".
pub fn multi_name(card: &Card) -> String {
    if !card.is_multi_faced() {
        return card.name.clone();
    }
    printed_faces(card)
        .iter()
        .map(|face| face.name.as_str())
        .collect::<Vec<_>>()
        .join(" // ")
}

/// All printed mana costs joined with " // ", skipping faces without one.
pub fn multi_mana_cost(card: &Card) -> String {
    if !card.is_multi_faced() {
        return card.mana_cost.clone().unwrap_or_default();
    }
    printed_faces(card)
        .iter()
        .filter_map(|face| face.mana_cost.as_deref())
        .collect::<Vec<_>>()
        .join(" // ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::FaceGroup;

    fn face(name: &str, layout: Layout, side: Option<Side>, mana: Option<&str>) -> Card {
        Card {
            name: name.to_string(),
            faces: FaceGroup::new(name.to_lowercase(), side, None),
            layout,
            mana_cost: mana.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_redirect_side_b_of_adventure() {
        let names = vec!["Bonecrusher Giant".to_string(), "Stomp".to_string()];
        assert_eq!(
            canonical_redirect(Layout::Adventure, Some(Side::B), &names),
            Some("Bonecrusher Giant")
        );
        assert_eq!(canonical_redirect(Layout::Adventure, Some(Side::A), &names), None);
    }

    #[test]
    fn test_no_redirect_for_transform_and_meld() {
        let names = vec!["Delver of Secrets".to_string(), "Insectile Aberration".to_string()];
        assert_eq!(canonical_redirect(Layout::Transform, Some(Side::B), &names), None);
        assert_eq!(canonical_redirect(Layout::Meld, Some(Side::B), &names), None);
    }

    #[test]
    fn test_multi_name_sorts_by_side() {
        let mut card = face("Stomp", Layout::Adventure, Some(Side::B), Some("1R"));
        card.names = vec!["Bonecrusher Giant".to_string(), "Stomp".to_string()];
        card.other_faces = vec![face(
            "Bonecrusher Giant",
            Layout::Adventure,
            Some(Side::A),
            Some("2R"),
        )];
        assert_eq!(multi_name(&card), "Bonecrusher Giant // Stomp");
        assert_eq!(multi_mana_cost(&card), "2R // 1R");
    }

    #[test]
    fn test_multi_name_meld_skips_partner() {
        let mut card = face("Bruna, the Fading Light", Layout::Meld, Some(Side::A), Some("5WW"));
        card.names = vec![
            "Bruna, the Fading Light".to_string(),
            "Gisela, the Broken Blade".to_string(),
            "Brisela, Voice of Nightmares".to_string(),
        ];
        card.other_faces = vec![
            face("Gisela, the Broken Blade", Layout::Meld, Some(Side::B), Some("2WW")),
            face("Brisela, Voice of Nightmares", Layout::Meld, Some(Side::C), None),
        ];
        assert_eq!(
            multi_name(&card),
            "Bruna, the Fading Light // Brisela, Voice of Nightmares"
        );
        assert_eq!(multi_mana_cost(&card), "5WW");
    }

    #[test]
    fn test_single_faced_name() {
        let card = face("Serra Angel", Layout::Normal, None, Some("3WW"));
        assert_eq!(multi_name(&card), "Serra Angel");
        assert_eq!(multi_mana_cost(&card), "3WW");
    }
}
