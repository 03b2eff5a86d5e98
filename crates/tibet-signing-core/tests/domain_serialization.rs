use std::collections::BTreeSet;

use tibet_signing_core::{
    chia_required_namespaces, create_offer_params, ActionType, Asset, ConnectParams,
    GenerateOfferData, OfferLeg, PairingSession, SignedOffer, Token, build_offer_delta,
};

fn token(asset_id: &str, short_name: &str) -> Token {
    Token {
        asset_id: asset_id.to_owned(),
        pair_id: format!("pair-{short_name}"),
        name: short_name.to_owned(),
        short_name: short_name.to_owned(),
        image_url: String::new(),
        verified: true,
    }
}

#[test]
fn action_types_serialize_screaming_snake() {
    let json = serde_json::to_string(&[
        ActionType::Swap,
        ActionType::AddLiquidity,
        ActionType::RemoveLiquidity,
    ])
    .expect("serialize actions");
    assert_eq!(json, r#"["SWAP","ADD_LIQUIDITY","REMOVE_LIQUIDITY"]"#);
}

#[test]
fn generate_offer_data_maps_native_legs_to_native_assets() {
    let xch = token("", "XCH");
    let dbx = token(
        "db1a9020d48d9d4ad22631b66ab4b9ebd3637ef7758ad38881348c5d24c38f20",
        "DBX",
    );
    let data = GenerateOfferData {
        pair_id: "pair-DBX".to_owned(),
        offer: vec![OfferLeg {
            token: xch,
            is_native: true,
            amount: 1_000_000,
        }],
        request: vec![OfferLeg {
            token: dbx.clone(),
            is_native: false,
            amount: 4_200,
        }],
        action: ActionType::Swap,
    };

    let (request, offer) = data.to_assets();
    assert_eq!(request, vec![Asset::token(dbx.asset_id, 4_200)]);
    assert_eq!(offer, vec![Asset::native(1_000_000)]);
}

#[test]
fn offer_params_match_signer_wire_shape() {
    let delta = build_offer_delta(&[Asset::native(1000)], &[Asset::token("TOKENX", 50)])
        .expect("delta");
    let params = create_offer_params(&delta);
    assert_eq!(
        params,
        serde_json::json!({
            "offer": { "": 1000, "TOKENX": -50 },
            "driverDict": {},
            "disableJSONFormatting": true,
        })
    );
}

#[test]
fn connect_params_omit_missing_pairing_topic() {
    let params = ConnectParams {
        pairing_topic: None,
        required_namespaces: chia_required_namespaces(),
    };
    let json = serde_json::to_value(&params).expect("serialize params");
    assert!(json.get("pairingTopic").is_none());
    assert_eq!(
        json["requiredNamespaces"]["chia"]["chains"],
        serde_json::json!(["chia:mainnet"])
    );
    assert_eq!(
        json["requiredNamespaces"]["chia"]["methods"],
        serde_json::json!(["chia_createOfferForIds", "chia_signMessageByAddress"])
    );
}

#[test]
fn pairing_session_defaults_missing_grants() {
    let pairing: PairingSession =
        serde_json::from_str(r#"{"topic":"abc","active":true}"#).expect("parse pairing");
    assert!(pairing.active);
    assert_eq!(pairing.granted_methods, BTreeSet::new());
}

#[test]
fn signed_offer_stays_opaque() {
    let raw = serde_json::json!({ "offer": "offer1qqz83wcsltt", "id": 7 });
    let signed = SignedOffer(raw.clone());
    assert_eq!(signed.offer_text(), Some("offer1qqz83wcsltt"));
    assert_eq!(serde_json::to_value(&signed).expect("serialize"), raw);
}
