//! Validated payloads handed to the ERP
//!
//! Field names mirror the stored procedure parameters.

use chrono::NaiveDate;
use serde::Serialize;

/// Order header for `sp_inserepedidositemercado`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload {
    pub nropedidoafv: String,
    pub nroempresa: i64,
    pub nrocgccpf: String,
    pub digcgccpf: String,
    pub nomerazao: String,
    pub fantasia: String,
    pub fisicajuridica: String,
    pub sexo: Option<String>,
    pub cidade: String,
    pub uf: String,
    pub bairro: String,
    pub logradouro: String,
    pub nrologradouro: String,
    pub cmpltologradouro: Option<String>,
    pub cep: String,
    pub foneddd1: Option<String>,
    pub fonenro1: Option<String>,
    pub foneddd2: Option<String>,
    pub fonenro2: Option<String>,
    pub inscricaorg: Option<String>,
    pub dtanascfund: Option<NaiveDate>,
    pub email: String,
    pub emailnfe: String,
    pub indentregaretira: String,
    pub dtapedidoafv: NaiveDate,
    pub vlrtotfrete: f64,
    pub valor: f64,
    pub nroformapagto: i64,
    pub usuinclusao: String,
    pub nroparcelas: i64,
    pub codoperadoracartao: Option<i64>,
    pub nrocartao: Option<String>,
}

/// Order line for `sp_insereitenssitemercado`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    pub nropedidoafv: String,
    pub seqpedvendaitem: i64,
    pub codacesso: String,
    pub seqproduto: i64,
    pub qtdpedida: f64,
    pub qtdembalagem: f64,
    pub vlrembtabpreco: f64,
    pub vlrembinformado: f64,
}
