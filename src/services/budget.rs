// src/services/budget.rs

use rust_decimal::Decimal;

/// Calcula o orçamento de uma ordem: preço do serviço mais o valor dos
/// insumos consumidos. Função pura, aritmética decimal exata — é dinheiro.
pub fn calcular(service_price: Decimal, items: &[(i32, Decimal)]) -> Decimal {
    items
        .iter()
        .fold(service_price, |total, (quantity, unit_price)| {
            total + Decimal::from(*quantity) * unit_price
        })
}
