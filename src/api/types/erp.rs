//! Request bodies of the ERP passthrough endpoints

use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::json::ValidatedRequest;
use crate::domain::validation::{parse_date, rule_error, validate_date};
use crate::domain::{DomainError, ItemPayload, OrderPayload};

fn validate_person_type(value: &str) -> Result<(), ValidationError> {
    match value {
        "F" | "J" => Ok(()),
        _ => Err(rule_error("in", "The fisicajuridica field must be F or J.")),
    }
}

fn validate_sex(value: &str) -> Result<(), ValidationError> {
    match value {
        "M" | "F" => Ok(()),
        _ => Err(rule_error("in", "The sexo field must be M or F.")),
    }
}

fn validate_delivery_mode(value: &str) -> Result<(), ValidationError> {
    match value {
        "E" | "R" => Ok(()),
        _ => Err(rule_error("in", "The indentregaretira field must be E or R.")),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::validation(format!("The {} field is required.", field)))
}

fn required_date(value: Option<String>, field: &str) -> Result<chrono::NaiveDate, DomainError> {
    let raw = required(value, field)?;
    parse_date(&raw)
        .ok_or_else(|| DomainError::validation(format!("The {} field must be a valid date.", field)))
}

/// `POST /api/v1/site-mercado/pedidos`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct OrderRequest {
    #[validate(required, length(max = 20))]
    pub nropedidoafv: Option<String>,
    #[validate(required)]
    pub nroempresa: Option<i64>,
    #[validate(required, length(max = 14))]
    pub nrocgccpf: Option<String>,
    #[validate(required, length(max = 2))]
    pub digcgccpf: Option<String>,
    #[validate(required, length(max = 200))]
    pub nomerazao: Option<String>,
    #[validate(length(max = 200))]
    pub fantasia: Option<String>,
    #[validate(required, custom(function = "validate_person_type"))]
    pub fisicajuridica: Option<String>,
    #[validate(custom(function = "validate_sex"))]
    pub sexo: Option<String>,
    #[validate(required, length(max = 100))]
    pub cidade: Option<String>,
    #[validate(required, length(equal = 2))]
    pub uf: Option<String>,
    #[validate(required, length(max = 100))]
    pub bairro: Option<String>,
    #[validate(required, length(max = 200))]
    pub logradouro: Option<String>,
    #[validate(required, length(max = 20))]
    pub nrologradouro: Option<String>,
    #[validate(length(max = 100))]
    pub cmpltologradouro: Option<String>,
    #[validate(required, length(max = 10))]
    pub cep: Option<String>,
    #[validate(length(max = 3))]
    pub foneddd1: Option<String>,
    #[validate(length(max = 15))]
    pub fonenro1: Option<String>,
    #[validate(length(max = 3))]
    pub foneddd2: Option<String>,
    #[validate(length(max = 15))]
    pub fonenro2: Option<String>,
    #[validate(length(max = 20))]
    pub inscricaorg: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub dtanascfund: Option<String>,
    #[validate(required, email, length(max = 200))]
    pub email: Option<String>,
    #[validate(email, length(max = 200))]
    pub emailnfe: Option<String>,
    #[validate(required, custom(function = "validate_delivery_mode"))]
    pub indentregaretira: Option<String>,
    #[validate(required, custom(function = "validate_date"))]
    pub dtapedidoafv: Option<String>,
    #[validate(range(min = 0.0))]
    pub vlrtotfrete: Option<f64>,
    #[validate(required, range(min = 0.0))]
    pub valor: Option<f64>,
    #[validate(required)]
    pub nroformapagto: Option<i64>,
    #[validate(required, length(max = 50))]
    pub usuinclusao: Option<String>,
    #[validate(required, range(min = 1))]
    pub nroparcelas: Option<i64>,
    pub codoperadoracartao: Option<i64>,
    #[validate(length(max = 20))]
    pub nrocartao: Option<String>,
}

impl ValidatedRequest for OrderRequest {
    const FAILURE_MESSAGE: &'static str = "Order data validation failed";
}

impl TryFrom<OrderRequest> for OrderPayload {
    type Error = DomainError;

    /// Fills the optional defaults: `fantasia` from `nomerazao`, `emailnfe`
    /// from `email`, and a zero freight value.
    fn try_from(request: OrderRequest) -> Result<Self, Self::Error> {
        let nomerazao = required(request.nomerazao, "nomerazao")?;
        let email = required(request.email, "email")?;
        let dtanascfund = match request.dtanascfund {
            Some(raw) => Some(parse_date(&raw).ok_or_else(|| {
                DomainError::validation("The dtanascfund field must be a valid date.")
            })?),
            None => None,
        };

        Ok(Self {
            nropedidoafv: required(request.nropedidoafv, "nropedidoafv")?,
            nroempresa: required(request.nroempresa, "nroempresa")?,
            nrocgccpf: required(request.nrocgccpf, "nrocgccpf")?,
            digcgccpf: required(request.digcgccpf, "digcgccpf")?,
            fantasia: request.fantasia.unwrap_or_else(|| nomerazao.clone()),
            nomerazao,
            fisicajuridica: required(request.fisicajuridica, "fisicajuridica")?,
            sexo: request.sexo,
            cidade: required(request.cidade, "cidade")?,
            uf: required(request.uf, "uf")?,
            bairro: required(request.bairro, "bairro")?,
            logradouro: required(request.logradouro, "logradouro")?,
            nrologradouro: required(request.nrologradouro, "nrologradouro")?,
            cmpltologradouro: request.cmpltologradouro,
            cep: required(request.cep, "cep")?,
            foneddd1: request.foneddd1,
            fonenro1: request.fonenro1,
            foneddd2: request.foneddd2,
            fonenro2: request.fonenro2,
            inscricaorg: request.inscricaorg,
            dtanascfund,
            emailnfe: request.emailnfe.unwrap_or_else(|| email.clone()),
            email,
            indentregaretira: required(request.indentregaretira, "indentregaretira")?,
            dtapedidoafv: required_date(request.dtapedidoafv, "dtapedidoafv")?,
            vlrtotfrete: request.vlrtotfrete.unwrap_or(0.0),
            valor: required(request.valor, "valor")?,
            nroformapagto: required(request.nroformapagto, "nroformapagto")?,
            usuinclusao: required(request.usuinclusao, "usuinclusao")?,
            nroparcelas: required(request.nroparcelas, "nroparcelas")?,
            codoperadoracartao: request.codoperadoracartao,
            nrocartao: request.nrocartao,
        })
    }
}

/// `POST /api/v1/site-mercado/itens`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ItemRequest {
    #[validate(required, length(max = 20))]
    pub nropedidoafv: Option<String>,
    #[validate(required, range(min = 1))]
    pub seqpedvendaitem: Option<i64>,
    #[validate(required, length(max = 50))]
    pub codacesso: Option<String>,
    #[validate(required, range(min = 1))]
    pub seqproduto: Option<i64>,
    #[validate(required, range(min = 0.01))]
    pub qtdpedida: Option<f64>,
    #[validate(required, range(min = 0.01))]
    pub qtdembalagem: Option<f64>,
    #[validate(required, range(min = 0.0))]
    pub vlrembtabpreco: Option<f64>,
    #[validate(required, range(min = 0.0))]
    pub vlrembinformado: Option<f64>,
}

impl ValidatedRequest for ItemRequest {
    const FAILURE_MESSAGE: &'static str = "Item data validation failed";
}

impl TryFrom<ItemRequest> for ItemPayload {
    type Error = DomainError;

    fn try_from(request: ItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            nropedidoafv: required(request.nropedidoafv, "nropedidoafv")?,
            seqpedvendaitem: required(request.seqpedvendaitem, "seqpedvendaitem")?,
            codacesso: required(request.codacesso, "codacesso")?,
            seqproduto: required(request.seqproduto, "seqproduto")?,
            qtdpedida: required(request.qtdpedida, "qtdpedida")?,
            qtdembalagem: required(request.qtdembalagem, "qtdembalagem")?,
            vlrembtabpreco: required(request.vlrembtabpreco, "vlrembtabpreco")?,
            vlrembinformado: required(request.vlrembinformado, "vlrembinformado")?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::types::error::field_errors;
    use serde_json::{json, Value};

    pub(crate) fn valid_order() -> Value {
        json!({
            "nropedidoafv": "PED-1001",
            "nroempresa": 1,
            "nrocgccpf": "12345678901",
            "digcgccpf": "23",
            "nomerazao": "Maria Silva",
            "fisicajuridica": "F",
            "sexo": "F",
            "cidade": "Curitiba",
            "uf": "PR",
            "bairro": "Centro",
            "logradouro": "Rua XV de Novembro",
            "nrologradouro": "100",
            "cep": "80020-310",
            "email": "maria@example.com",
            "indentregaretira": "E",
            "dtapedidoafv": "2026-10-01",
            "valor": 150.75,
            "nroformapagto": 3,
            "usuinclusao": "SITEMERCADO",
            "nroparcelas": 1
        })
    }

    pub(crate) fn valid_item() -> Value {
        json!({
            "nropedidoafv": "PED-1001",
            "seqpedvendaitem": 1,
            "codacesso": "7891000100103",
            "seqproduto": 4521,
            "qtdpedida": 2.0,
            "qtdembalagem": 1.0,
            "vlrembtabpreco": 9.9,
            "vlrembinformado": 9.5
        })
    }

    fn order(value: Value) -> OrderRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_order_fills_defaults() {
        let request = order(valid_order());
        assert!(request.validate().is_ok());

        let payload = OrderPayload::try_from(request).unwrap();
        assert_eq!(payload.fantasia, "Maria Silva");
        assert_eq!(payload.emailnfe, "maria@example.com");
        assert_eq!(payload.vlrtotfrete, 0.0);
        assert_eq!(
            payload.dtapedidoafv,
            chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
        assert!(payload.dtanascfund.is_none());
    }

    #[test]
    fn test_explicit_optional_values_are_kept() {
        let mut body = valid_order();
        body["fantasia"] = json!("Mercado da Maria");
        body["emailnfe"] = json!("nfe@example.com");
        body["vlrtotfrete"] = json!(12.5);
        body["dtanascfund"] = json!("1990-05-20");

        let payload = OrderPayload::try_from(order(body)).unwrap();
        assert_eq!(payload.fantasia, "Mercado da Maria");
        assert_eq!(payload.emailnfe, "nfe@example.com");
        assert_eq!(payload.vlrtotfrete, 12.5);
        assert_eq!(
            payload.dtanascfund,
            chrono::NaiveDate::from_ymd_opt(1990, 5, 20)
        );
    }

    #[test]
    fn test_order_rule_violations_name_the_field() {
        let cases = [
            ("nropedidoafv", Value::Null),
            ("nropedidoafv", json!("X".repeat(21))),
            ("uf", json!("PRR")),
            ("uf", json!("P")),
            ("fisicajuridica", json!("X")),
            ("sexo", json!("O")),
            ("indentregaretira", json!("D")),
            ("email", json!("not-an-email")),
            ("emailnfe", json!("nope")),
            ("dtapedidoafv", json!("01/10/2026")),
            ("dtanascfund", json!("yesterday")),
            ("valor", json!(-1)),
            ("vlrtotfrete", json!(-0.5)),
            ("nroparcelas", json!(0)),
            ("cep", json!("12345678901")),
            ("foneddd1", json!("0411")),
            ("nrocartao", json!("1".repeat(21))),
        ];

        for (field, value) in cases {
            let mut body = valid_order();
            body[field] = value;

            let errors = order(body).validate().unwrap_err();
            let map = field_errors(&errors);
            assert!(map.contains_key(field), "expected an error for {}", field);
        }
    }

    #[test]
    fn test_missing_required_order_fields() {
        let errors = OrderRequest::default().validate().unwrap_err();
        let map = field_errors(&errors);

        for field in ["nropedidoafv", "nroempresa", "email", "dtapedidoafv", "valor"] {
            assert!(map.contains_key(field), "expected {} to be required", field);
        }
        assert!(!map.contains_key("fantasia"));
        assert!(!map.contains_key("codoperadoracartao"));
    }

    #[test]
    fn test_item_rules() {
        let request: ItemRequest = serde_json::from_value(valid_item()).unwrap();
        assert!(request.validate().is_ok());

        let cases = [
            ("seqpedvendaitem", json!(0)),
            ("seqproduto", json!(0)),
            ("qtdpedida", json!(0.0)),
            ("qtdembalagem", json!(0.001)),
            ("vlrembtabpreco", json!(-1)),
            ("vlrembinformado", json!(-0.01)),
            ("codacesso", json!("9".repeat(51))),
            ("nropedidoafv", Value::Null),
        ];

        for (field, value) in cases {
            let mut body = valid_item();
            body[field] = value;

            let request: ItemRequest = serde_json::from_value(body).unwrap();
            let map = field_errors(&request.validate().unwrap_err());
            assert!(map.contains_key(field), "expected an error for {}", field);
        }
    }

    #[test]
    fn test_item_payload_conversion() {
        let request: ItemRequest = serde_json::from_value(valid_item()).unwrap();
        let payload = ItemPayload::try_from(request).unwrap();

        assert_eq!(payload.nropedidoafv, "PED-1001");
        assert_eq!(payload.seqpedvendaitem, 1);
        assert_eq!(payload.vlrembinformado, 9.5);
    }
}
