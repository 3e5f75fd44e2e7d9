//! Built-in word table.

/// `(masculine, feminine)` pairs, lower-case.
///
/// "his" and "hers" never appear here; they and the adjective "her" are
/// rewritten by the possessive rules in [`super::Lexicon`].
pub(crate) const BUILTIN_PAIRS: &[(&str, &str)] = &[
    ("he", "she"),
    ("him", "her"),
    ("himself", "herself"),
    ("man", "woman"),
    ("men", "women"),
    ("male", "female"),
    ("males", "females"),
    ("boy", "girl"),
    ("boys", "girls"),
    ("father", "mother"),
    ("fathers", "mothers"),
    ("dad", "mom"),
    ("daddy", "mommy"),
    ("son", "daughter"),
    ("sons", "daughters"),
    ("brother", "sister"),
    ("brothers", "sisters"),
    ("uncle", "aunt"),
    ("uncles", "aunts"),
    ("nephew", "niece"),
    ("nephews", "nieces"),
    ("husband", "wife"),
    ("husbands", "wives"),
    ("grandfather", "grandmother"),
    ("grandfathers", "grandmothers"),
    ("grandpa", "grandma"),
    ("grandson", "granddaughter"),
    ("stepfather", "stepmother"),
    ("stepson", "stepdaughter"),
    ("stepbrother", "stepsister"),
    ("godfather", "godmother"),
    ("godson", "goddaughter"),
    ("mr", "ms"),
    ("sir", "madam"),
    ("gentleman", "gentlewoman"),
    ("gentlemen", "gentlewomen"),
    ("lord", "lady"),
    ("lords", "ladies"),
    ("king", "queen"),
    ("kings", "queens"),
    ("prince", "princess"),
    ("princes", "princesses"),
    ("duke", "duchess"),
    ("baron", "baroness"),
    ("count", "countess"),
    ("emperor", "empress"),
    ("actor", "actress"),
    ("waiter", "waitress"),
    ("steward", "stewardess"),
    ("host", "hostess"),
    ("hero", "heroine"),
    ("heroes", "heroines"),
    ("god", "goddess"),
    ("gods", "goddesses"),
    ("priest", "priestess"),
    ("monk", "nun"),
    ("monks", "nuns"),
    ("wizard", "witch"),
    ("wizards", "witches"),
    ("widower", "widow"),
    ("widowers", "widows"),
    ("bachelor", "bachelorette"),
    ("groom", "bride"),
    ("salesman", "saleswoman"),
    ("salesmen", "saleswomen"),
    ("businessman", "businesswoman"),
    ("businessmen", "businesswomen"),
    ("congressman", "congresswoman"),
    ("congressmen", "congresswomen"),
    ("policeman", "policewoman"),
    ("policemen", "policewomen"),
    ("fireman", "firewoman"),
    ("firemen", "firewomen"),
    ("spokesman", "spokeswoman"),
    ("spokesmen", "spokeswomen"),
    ("chairman", "chairwoman"),
    ("chairmen", "chairwomen"),
    ("boyfriend", "girlfriend"),
    ("boyfriends", "girlfriends"),
    ("manhood", "womanhood"),
    ("mankind", "womankind"),
    ("masculine", "feminine"),
    ("masculinity", "femininity"),
    ("lad", "lass"),
    ("lads", "lasses"),
    ("guy", "gal"),
    ("guys", "gals"),
];
